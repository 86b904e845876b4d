#![allow(non_snake_case)]
//! The demo screen: an example card, a color swatch with a "Change Color"
//! button, a greeting field that shows a snackbar, a lazy list of 100 rows
//! and a side-effect counter.
//!
//! Everything the screen needs from outside (the render counter, the color
//! generator and the snackbar queue) comes in through `Services`, so tests
//! can seed and inspect it.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use composable_core::*;
use composable_ui::{
    Box as BoxView, Button, Card, Column, Image, ImageExt, LazyColumn, Row, Scaffold, ScrollArea,
    SnackbarHost, SnackbarHostState, StyledText, Text, TextField, TextStyle, ViewExt,
    remember_lazy_list_state, remember_scroll_state,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Environment variable holding a `u64` seed for the color generator.
pub const SEED_VAR: &str = "COMPOSABLE_SEED";

pub const ROW_COUNT: usize = 100;
pub const ROW_HEIGHT_DP: f32 = 40.0;
pub const LIST_HEIGHT_DP: f32 = 200.0;

pub const HEADER_IMAGE: &str = "header";
pub const HEADER_DESCRIPTION: &str = "An Example of jetpack compose";

/// Counts completed passes of the counter widget for the life of the
/// process. Not observable: bumping it never schedules a pass.
#[derive(Clone, Debug, Default)]
pub struct RenderCounter(Arc<AtomicUsize>);

impl RenderCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) -> usize {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

/// Source of random opaque colors for the swatch.
#[derive(Clone)]
pub struct ColorSource(Rc<RefCell<Box<dyn RngCore>>>);

impl ColorSource {
    pub fn new(rng: impl RngCore + 'static) -> Self {
        Self(Rc::new(RefCell::new(Box::new(rng))))
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Seeded from `COMPOSABLE_SEED` when it holds a number, from OS
    /// entropy otherwise.
    pub fn from_env() -> Self {
        match std::env::var(SEED_VAR).ok().map(|s| s.trim().parse::<u64>()) {
            Some(Ok(seed)) => {
                log::info!("colors seeded with {seed}");
                Self::seeded(seed)
            }
            Some(Err(e)) => {
                log::warn!("ignoring {SEED_VAR}: {e}");
                Self::new(StdRng::from_entropy())
            }
            None => Self::new(StdRng::from_entropy()),
        }
    }

    pub fn next_color(&self) -> Color {
        let mut rng = self.0.borrow_mut();
        Color::random_opaque(&mut **rng)
    }
}

impl std::fmt::Debug for ColorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ColorSource")
    }
}

#[derive(Clone, Debug)]
pub struct Services {
    pub counter: RenderCounter,
    pub colors: ColorSource,
    pub snackbar: SnackbarHostState,
    pub dark: bool,
}

impl Services {
    pub fn new(colors: ColorSource) -> Self {
        Self {
            counter: RenderCounter::new(),
            colors,
            snackbar: SnackbarHostState::new(),
            dark: false,
        }
    }

    pub fn from_env() -> Self {
        Self::new(ColorSource::from_env())
    }
}

pub fn demo_theme(dark: bool) -> Theme {
    if dark { Theme::dark() } else { Theme::light() }
}

/// Header picture for the card: a purple to teal vertical fade.
pub fn header_resources() -> ResourceTable {
    const W: u32 = 64;
    const H: u32 = 32;
    let top = Color::from_hex("#6200EE");
    let bottom = Color::from_hex("#03DAC5");
    let mut rgba = Vec::with_capacity((W * H * 4) as usize);
    for y in 0..H {
        let px = top.lerp(bottom, y as f32 / (H - 1) as f32).to_rgba8();
        for _ in 0..W {
            rgba.extend_from_slice(&px);
        }
    }
    let mut table = ResourceTable::new();
    if let Err(e) = table.register_image(HEADER_IMAGE, W, H, rgba) {
        log::warn!("header image: {e}");
    }
    table
}

/// "ExampleOfJetpackCompose" with each word's initial in large underlined
/// green.
pub fn example_title() -> AnnotatedString {
    let initial = SpanStyle::new()
        .color(Color::GREEN)
        .font_size(20.0)
        .decoration(TextDecoration::Underline);
    build_annotated_string(|b| {
        for word in ["Example", "Of", "Jetpack", "Compose"] {
            let (head, rest) = word.split_at(1);
            b.with_style(initial, |b| {
                b.append(head);
            });
            b.append(rest);
        }
    })
}

/// Labels of every row the list can show, independent of scrolling.
pub fn row_labels() -> Vec<String> {
    (0..ROW_COUNT).map(row_label).collect()
}

fn row_label(i: usize) -> String {
    format!("Item {i}")
}

pub fn MainScreen(services: &Services) -> View {
    let resources = remember(|| Rc::new(header_resources()));
    with_resources((*resources).clone(), || {
        with_theme(demo_theme(services.dark), || Screen(services))
    })
}

fn Screen(services: &Services) -> View {
    let color = remember_state(|| Color::RED);
    let name = remember_state(String::new);
    let clicks = remember_state(|| 0u32);
    let tasks = remember_task_scope();
    let scroll = remember_scroll_state("screen_scroll");
    let list = remember_lazy_list_state("item_list");
    log::debug!("Recompose Column");

    let on_confirm: Rc<dyn Fn()> = {
        let name = name.clone();
        let snackbar = services.snackbar.clone();
        Rc::new(move || {
            let greeting = snackbar.show_snackbar(format!("Hello {}", name.get()));
            tasks.launch(async move {
                let result = greeting.await;
                log::debug!("greeting closed: {result:?}");
            });
        })
    };
    let on_name_change = {
        let name = name.clone();
        move |s: String| name.set(s)
    };
    let on_increment: Rc<dyn Fn()> = {
        let clicks = clicks.clone();
        Rc::new(move || clicks.update(|n| *n += 1))
    };

    let content = Column(Modifier::new().fill_max_width()).child((
        BoxView(Modifier::new()
            .fill_max_width_fraction(0.5)
            .padding(16.0)
            .align_self_center())
        .child(ExampleCard(
            Modifier::new(),
            HEADER_IMAGE,
            example_title(),
            HEADER_DESCRIPTION,
        )),
        ColorRow(color, services.colors.clone()),
        GreetingEditText(name.observe(), on_name_change, on_confirm),
        ItemList(list),
        SideEffectCounter(
            services.counter.clone(),
            clicks.observe().to_string(),
            on_increment,
        ),
    ));

    Scaffold(
        SnackbarHost(services.snackbar.clone()),
        ScrollArea(Modifier::new().fill_max_size(), scroll, content),
    )
}

/// 200dp picture with a dark scrim and the title pinned bottom-start.
pub fn ExampleCard(
    modifier: Modifier,
    image: &str,
    title: AnnotatedString,
    description: &str,
) -> View {
    Card(
        modifier.fill_max_width().clip_rounded(15.0).elevation(5.0),
        BoxView(Modifier::new().fill_max_width().height(200.0)).child((
            Image(Modifier::new().fill_max_size(), image, Some(description))
                .content_scale(ContentScale::Crop),
            BoxView(Modifier::new()
                .absolute()
                .offset(Some(0.0), Some(0.0), Some(0.0), Some(0.0))
                .background_brush(LinearGradient::vertical(Color::TRANSPARENT, Color::BLACK))),
            BoxView(Modifier::new()
                .absolute()
                .offset(Some(0.0), None, Some(0.0), Some(0.0))
                .padding(12.0))
            .child(StyledText(title).color(Color::WHITE).size(16.0)),
        )),
    )
}

/// Swatch plus "Change Color". The color lives with the caller; only this
/// scope observes it.
fn ColorRow(color: MutableState<Color>, colors: ColorSource) -> View {
    compose_scope("color_row", (), move || {
        log::debug!("Recompose Row");
        let current = color.observe();
        let change = {
            let color = color.clone();
            let colors = colors.clone();
            move || color.set(colors.next_color())
        };
        Row(Modifier::new()
            .fill_max_width()
            .align_items(AlignItems::Center))
        .child((
            ColoredBox(
                current,
                &channel_string(current.red),
                &channel_string(current.green),
                &channel_string(current.blue),
                Modifier::new().weight(1.0),
            ),
            Button("Change Color", change).modifier(Modifier::new().padding(6.0)),
        ))
    })
}

pub fn ColoredBox(color: Color, red: &str, green: &str, blue: &str, modifier: Modifier) -> View {
    BoxView(modifier.background(color).fill_max_width()).child(
        Column(Modifier::new()
            .fill_max_width()
            .align_items(AlignItems::Center))
        .child((
            Text(format!("R: {red}")),
            Text(format!("G: {green}")),
            Text(format!("B: {blue}")),
        )),
    )
}

/// Controlled greeting field. Enter in the field confirms like the button.
pub fn GreetingEditText(
    value: String,
    on_value_change: impl Fn(String) + 'static,
    on_confirm: Rc<dyn Fn()>,
) -> View {
    let on_submit = {
        let on_confirm = on_confirm.clone();
        move |_: String| on_confirm()
    };
    Row(Modifier::new().fill_max_width().padding(8.0)).child((
        TextField(
            value,
            "Enter name",
            Modifier::new().weight(1.0).padding(8.0),
            on_value_change,
            on_submit,
        ),
        Button("Greet me", move || on_confirm()),
    ))
}

fn ItemList(state: composable_ui::LazyListState) -> View {
    LazyColumn(
        "items",
        ROW_COUNT,
        ROW_HEIGHT_DP,
        state,
        Modifier::new().fill_max_width().height(LIST_HEIGHT_DP),
        |i| {
            Text(row_label(i))
                .size(18.0)
                .color(Color::BLUE)
                .align(TextAlign::Center)
                .modifier(Modifier::new().fill_max_width())
        },
    )
}

/// Shows the render counter as read during this pass and bumps it once the
/// pass commits, so the readout trails the counter by one.
fn SideEffectCounter(counter: RenderCounter, value: String, on_increment: Rc<dyn Fn()>) -> View {
    compose_scope("counter", value.clone(), move || {
        let seen = counter.get();
        side_effect({
            let counter = counter.clone();
            move || {
                counter.increment();
            }
        });
        let on_increment = on_increment.clone();
        Column(Modifier::new().fill_max_width()).child((
            Text(format!("Value of i is {seen}")),
            Row(Modifier::new()
                .fill_max_width()
                .align_items(AlignItems::Center))
            .child((
                Text(value.clone()).modifier(Modifier::new().weight(1.0)),
                Button("Increment", move || on_increment()),
            )),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_initials_are_styled() {
        let title = example_title();
        assert_eq!(title.text, "ExampleOfJetpackCompose");
        let styled: Vec<&str> = title
            .fragments()
            .into_iter()
            .filter(|(_, style)| style.decoration == Some(TextDecoration::Underline))
            .map(|(s, _)| s)
            .collect();
        assert_eq!(styled, vec!["E", "O", "J", "C"]);
    }

    #[test]
    fn test_row_labels() {
        let labels = row_labels();
        assert_eq!(labels.len(), ROW_COUNT);
        assert_eq!(labels[0], "Item 0");
        assert_eq!(labels[99], "Item 99");
    }

    #[test]
    fn test_seeded_colors_repeat() {
        let a = ColorSource::seeded(42);
        let b = ColorSource::seeded(42);
        for _ in 0..4 {
            let c = a.next_color();
            assert_eq!(c, b.next_color());
            assert_eq!(c.alpha, 1.0);
        }
    }

    #[test]
    fn test_header_image_registered() {
        let table = header_resources();
        let handle = table.image(HEADER_IMAGE).unwrap();
        assert_eq!((handle.width, handle.height), (64, 32));
    }

    #[test]
    fn test_render_counter_is_shared() {
        let a = RenderCounter::new();
        let b = a.clone();
        a.increment();
        assert_eq!(b.increment(), 2);
        assert_eq!(a.get(), 2);
    }
}
