pub use crate::clock::{Clock, SystemClock, TestClock};
pub use crate::color::{Brush, Color, LinearGradient, channel_string};
pub use crate::effects::{Dispose, disposable_effect, on_unmount, side_effect};
pub use crate::error::*;
pub use crate::geometry::{Rect, Size, Vec2};
pub use crate::locals::{
    Density, Dp, TextScale, Theme, density, dp_to_px, resources, sp_to_px, text_scale, theme,
    with_density, with_resources, with_text_scale, with_theme,
};
pub use crate::modifier::Modifier;
pub use crate::resources::{ImageHandle, ResourceTable, painter_resource};
pub use crate::runtime::{
    Composition, Frame, HitRegion, SemNode, compose_scope, remember, remember_state,
    remember_with_key,
};
pub use crate::scope::{Scope, current_scope, scoped_effect};
pub use crate::semantics::{Role, Semantics};
pub use crate::state::{MutableState, mutable_state_of};
pub use crate::tasks::{TaskScope, delay, remember_task_scope};
pub use crate::text::{AnnotatedString, SpanStyle, TextDecoration, build_annotated_string};
pub use crate::view::{ContentScale, Scene, SceneNode, TextAlign, View, ViewId, ViewKind};
pub use taffy::{AlignItems, AlignSelf, JustifyContent};
