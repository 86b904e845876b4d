use composable_core::*;

use crate::{Box, Surface, ViewExt};

/// Rounded surface with an outline and a shadow. Corner radius and
/// elevation already set on `modifier` are kept.
pub fn Card(modifier: Modifier, content: View) -> View {
    let th = theme();
    let radius = modifier.clip_rounded.unwrap_or(12.0);
    let elevation = modifier.elevation.unwrap_or(2.0);
    Surface(
        modifier
            .background(th.surface)
            .border(1.0, th.outline, radius)
            .clip_rounded(radius)
            .elevation(elevation),
        content,
    )
}

/// Full-size container for screen content with a snackbar host pinned to
/// the bottom edge.
pub fn Scaffold(snackbar_host: View, content: View) -> View {
    Box(Modifier::new().fill_max_size()).child((
        Box(Modifier::new().fill_max_size()).child(content),
        Box(Modifier::new()
            .absolute()
            .offset(Some(16.0), None, Some(16.0), Some(16.0)))
        .child(snackbar_host),
    ))
}
