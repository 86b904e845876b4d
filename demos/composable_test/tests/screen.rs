use composable_core::{Brush, Color, Role, Theme, ViewKind, channel_string};
use composable_headless::{HeadlessApp, HeadlessConfig};
use composable_test::{
    ColorSource, HEADER_DESCRIPTION, LIST_HEIGHT_DP, MainScreen, ROW_COUNT, ROW_HEIGHT_DP,
    Services, row_labels,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn launch(services: &Services) -> HeadlessApp {
    let mut app = HeadlessApp::new(
        {
            let services = services.clone();
            move || MainScreen(&services)
        },
        HeadlessConfig::default(),
    );
    app.frame().unwrap();
    app
}

fn readout(app: &HeadlessApp, prefix: &str) -> String {
    let found: Vec<String> = app
        .texts()
        .into_iter()
        .filter_map(|t| t.strip_prefix(prefix).map(str::to_string))
        .collect();
    assert_eq!(found.len(), 1, "one {prefix:?} readout, got {found:?}");
    found[0].clone()
}

fn field_value(app: &HeadlessApp) -> String {
    app.semantics()
        .iter()
        .find(|n| n.role == Role::TextField && n.label.as_deref() == Some("Enter name"))
        .and_then(|n| n.value.clone())
        .unwrap()
}

fn materialized_rows(app: &HeadlessApp) -> Vec<String> {
    app.composition()
        .tree()
        .collect_text()
        .into_iter()
        .filter(|t| t.starts_with("Item "))
        .collect()
}

#[test]
fn test_initial_screen() {
    let services = Services::new(ColorSource::seeded(1));
    let app = launch(&services);

    assert_eq!(readout(&app, "R: "), "1.0");
    assert_eq!(readout(&app, "G: "), "0.0");
    assert_eq!(readout(&app, "B: "), "0.0");
    assert_eq!(field_value(&app), "");

    let texts = app.texts();
    assert!(texts.contains(&"ExampleOfJetpackCompose".to_string()));
    assert!(texts.contains(&"Value of i is 0".to_string()));
    assert!(texts.contains(&"0".to_string()));

    let image = app
        .semantics()
        .iter()
        .find(|n| n.role == Role::Image)
        .unwrap();
    assert_eq!(image.label.as_deref(), Some(HEADER_DESCRIPTION));
}

#[test]
fn test_readouts_follow_latest_color() {
    let services = Services::new(ColorSource::seeded(7));
    let mut app = launch(&services);
    let mut expected = StdRng::seed_from_u64(7);

    for _ in 0..6 {
        app.click("Change Color").unwrap();
        let c = Color::random_opaque(&mut expected);
        assert_eq!(readout(&app, "R: "), channel_string(c.red));
        assert_eq!(readout(&app, "G: "), channel_string(c.green));
        assert_eq!(readout(&app, "B: "), channel_string(c.blue));
        for prefix in ["R: ", "G: ", "B: "] {
            let v: f32 = readout(&app, prefix).parse().unwrap();
            assert!((0.0..=1.0).contains(&v), "{prefix}{v} out of range");
        }
    }
}

#[test]
fn test_color_change_recomposes_only_the_row() {
    let services = Services::new(ColorSource::seeded(3));
    let mut app = launch(&services);
    let root = app.composition().recompositions("root");
    let row = app.composition().recompositions("root/color_row");
    let counter = app.composition().recompositions("root/counter");
    let items = app.composition().recompositions("root/items");

    app.click("Change Color").unwrap();

    let c = app.composition();
    assert_eq!(c.recompositions("root"), root);
    assert_eq!(c.recompositions("root/color_row"), row + 1);
    assert_eq!(c.recompositions("root/counter"), counter);
    assert_eq!(c.recompositions("root/items"), items);
    assert_eq!(app.stats().recomposed_scopes, 1);
}

#[test]
fn test_field_shows_last_change() {
    let services = Services::new(ColorSource::seeded(1));
    let mut app = launch(&services);
    app.focus_text_field("Enter name").unwrap();

    let mut typed = String::new();
    for ch in "Grace Hopper".chars() {
        app.type_text(&ch.to_string()).unwrap();
        typed.push(ch);
        assert_eq!(field_value(&app), typed);
    }

    app.backspace().unwrap();
    app.backspace().unwrap();
    typed.truncate(typed.len() - 2);
    assert_eq!(field_value(&app), typed);
}

#[test]
fn test_rows_are_virtualized() {
    let services = Services::new(ColorSource::seeded(1));
    let mut app = launch(&services);

    // 200dp viewport of 40dp rows, two rows of buffer below
    let rows = materialized_rows(&app);
    assert_eq!(rows, row_labels()[..7].to_vec());

    let left = app.scroll_at("Item 0", 400.0).unwrap();
    assert_eq!(left, 0.0);
    let rows = materialized_rows(&app);
    assert_eq!(rows.first().map(String::as_str), Some("Item 8"));
    assert_eq!(rows.last().map(String::as_str), Some("Item 16"));
    assert!(rows.len() < ROW_COUNT);
}

#[test]
fn test_scrolling_reaches_every_row_in_order() {
    let services = Services::new(ColorSource::seeded(1));
    let mut app = launch(&services);
    let max_offset = (ROW_COUNT as f32 * ROW_HEIGHT_DP - LIST_HEIGHT_DP).max(0.0);

    let mut seen: Vec<String> = Vec::new();
    let mut offset = 0.0_f32;
    loop {
        for row in materialized_rows(&app) {
            if !seen.contains(&row) {
                seen.push(row);
            }
        }
        if offset >= max_offset {
            break;
        }
        // first row whose top edge is inside the viewport
        let anchor = format!("Item {}", (offset / ROW_HEIGHT_DP).ceil() as usize);
        let step = 120.0_f32.min(max_offset - offset);
        assert_eq!(app.scroll_at(&anchor, step).unwrap(), 0.0);
        offset += step;
    }
    assert_eq!(seen, row_labels());
}

#[test]
fn test_increment_counts() {
    let services = Services::new(ColorSource::seeded(1));
    let mut app = launch(&services);
    let renders_before = services.counter.get();

    for n in 1..=5 {
        app.click("Increment").unwrap();
        assert!(app.texts().contains(&n.to_string()));
    }

    assert!(services.counter.get() >= renders_before + 5);
    let readout = format!("Value of i is {}", services.counter.get() - 1);
    assert!(app.texts().contains(&readout), "{:?}", app.texts());
}

#[test]
fn test_render_counter_does_not_schedule_work() {
    let services = Services::new(ColorSource::seeded(1));
    let mut app = launch(&services);
    services.counter.increment();
    app.frame().unwrap();
    assert_eq!(app.stats().recomposed_scopes, 0);
}

#[test]
fn test_rerender_is_idempotent() {
    let services = Services::new(ColorSource::seeded(1));
    let mut app = launch(&services);
    app.click("Change Color").unwrap();
    app.focus_text_field("Enter name").unwrap();
    app.type_text("Ada").unwrap();

    let before = serde_json::to_value(app.semantics()).unwrap();
    let renders = services.counter.get();
    app.composition().invalidate_all();
    app.frame().unwrap();

    assert_eq!(app.stats().recomposed_scopes, 1);
    assert_eq!(serde_json::to_value(app.semantics()).unwrap(), before);
    assert_eq!(services.counter.get(), renders);
}

#[test]
fn test_semantics_snapshot() {
    let services = Services::new(ColorSource::seeded(1));
    let app = launch(&services);
    let json = serde_json::to_value(app.semantics()).unwrap();

    let buttons: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["role"] == "Button")
        .filter_map(|n| n["label"].as_str())
        .collect();
    assert_eq!(buttons, vec!["Change Color", "Greet me", "Increment"]);

    let field = json
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["role"] == "TextField")
        .unwrap();
    assert_eq!(field["label"], "Enter name");
    assert_eq!(field["value"], "");
    assert_eq!(field["focused"], false);
}

#[test]
fn test_dark_theme_reaches_the_card() {
    let mut services = Services::new(ColorSource::seeded(1));
    services.dark = true;
    let app = launch(&services);

    let mut card_background = None;
    app.composition().tree().walk(&mut |v| {
        if matches!(v.kind, ViewKind::Surface) && v.modifier.clip_rounded == Some(15.0) {
            card_background = v.modifier.background.clone();
        }
    });
    assert_eq!(card_background, Some(Brush::Solid(Theme::dark().surface)));
}

#[test]
fn test_unknown_label_is_an_error() {
    let services = Services::new(ColorSource::seeded(1));
    let mut app = launch(&services);
    assert!(app.click("Item 0").is_err());
    assert!(app.click("Greet everyone").is_err());
}
