use composable_headless::{HeadlessApp, HeadlessConfig};
use composable_test::{MainScreen, Services};
use web_time::Duration;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut services = Services::from_env();
    services.dark = std::env::var("COMPOSABLE_THEME").is_ok_and(|t| t == "dark");

    let mut app = HeadlessApp::new(
        {
            let services = services.clone();
            move || MainScreen(&services)
        },
        HeadlessConfig::default(),
    );
    app.frame()?;

    app.click("Change Color")?;
    app.focus_text_field("Enter name")?;
    app.type_text("Ada")?;
    app.click("Greet me")?;
    log::info!("snackbar: {:?}", services.snackbar.current_message());

    let left = app.scroll_at("Item 0", 400.0)?;
    log::info!("list scrolled, {left}px left over");

    for _ in 0..3 {
        app.click("Increment")?;
    }
    app.advance(Duration::from_secs(4))?;

    log::info!(
        "{} frames, {} scope passes, render counter at {}",
        app.stats().frames,
        app.stats().total_recomposed,
        services.counter.get()
    );
    log::info!("{}", serde_json::to_string_pretty(app.semantics())?);
    Ok(())
}
