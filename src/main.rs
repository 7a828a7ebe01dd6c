//! Deepscroll entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlElement, HtmlInputElement, KeyboardEvent, TouchEvent, WheelEvent};

    use deepscroll::calibration::{Calibration, ReferenceObject};
    use deepscroll::persistence::LocalStorage;
    use deepscroll::session::Session;
    use deepscroll::sim::TickEvent;

    /// Line-mode wheel deltas are scaled to this many pixels per line
    const LINE_HEIGHT_PX: f32 = 16.0;

    /// App instance holding all state
    struct App {
        session: Session<LocalStorage>,
        /// Raw scroll input accumulated between frames, drained each tick
        pending_delta: f32,
        /// Last touch Y for delta extraction
        last_touch_y: Option<f32>,
        /// Calibration overlay state
        cal_reference: ReferenceObject,
        cal_base_px: f32,
        cal_scale: f32,
    }

    impl App {
        fn new(session: Session<LocalStorage>) -> Self {
            Self {
                session,
                pending_delta: 0.0,
                last_touch_y: None,
                cal_reference: ReferenceObject::CreditCard,
                cal_base_px: 0.0,
                cal_scale: 1.0,
            }
        }
    }

    /// Measure raw units per centimetre from a physically-sized probe
    /// element. Approximate: browsers assume 96 dpi for physical units,
    /// so this is a low-precision starting point.
    fn probe_px_per_cm(document: &Document) -> f32 {
        let Ok(probe) = document.create_element("div") else {
            return 0.0;
        };
        let Some(body) = document.body() else {
            return 0.0;
        };
        let _ = probe.set_attribute(
            "style",
            "position:absolute;visibility:hidden;width:10cm;height:1px;",
        );
        if body.append_child(&probe).is_err() {
            return 0.0;
        }
        let width = probe.get_bounding_client_rect().width() as f32;
        let _ = body.remove_child(&probe);
        width / 10.0
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if hidden { "hidden" } else { "" });
        }
    }

    fn format_depth(cm: f32) -> String {
        if cm >= 100.0 {
            format!("{:.2} m", cm / 100.0)
        } else {
            format!("{:.0} cm", cm)
        }
    }

    fn update_hud(document: &Document, app: &App, events: &[TickEvent]) {
        let s = &app.session;
        set_text(document, "hud-depth", &format_depth(s.depth_cm()));
        set_text(
            document,
            "hud-distance",
            &format_depth(s.state.stats.total_cm),
        );
        set_text(
            document,
            "hud-speed",
            &format!("{:.0} cm/s", s.state.stats.avg_speed_cms),
        );
        set_text(
            document,
            "hud-max-speed",
            &format!("{:.0} cm/s", s.state.stats.max_speed_cms),
        );
        set_text(
            document,
            "hud-time",
            &format!("{:.1} s", s.state.elapsed_secs),
        );
        set_text(document, "hud-best", &format_depth(s.best.cm()));
        set_text(
            document,
            "hud-inertia",
            if s.settings.inertia_enabled { "on" } else { "off" },
        );

        for event in events {
            match event {
                TickEvent::MilestoneReached { threshold_cm, elapsed_secs } => {
                    set_text(
                        document,
                        "toast",
                        &format!("{} in {:.1} s", format_depth(*threshold_cm), elapsed_secs),
                    );
                    set_hidden(document, "toast", false);
                }
                TickEvent::AchievementUnlocked { label, .. } => {
                    set_text(document, "toast", &format!("Title unlocked: {label}"));
                    set_hidden(document, "toast", false);
                }
                TickEvent::Grounded { .. } => {
                    // Surfacing clears transient notices with the run
                    set_hidden(document, "toast", true);
                }
                TickEvent::RunStarted => {}
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Deepscroll starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let probe = probe_px_per_cm(&document);
        let session = match Session::new(LocalStorage, probe) {
            Ok(session) => session,
            Err(err) => {
                // Fatal configuration error: refuse to start
                log::error!("Startup aborted: {err}");
                set_text(&document, "fatal", &err.to_string());
                set_hidden(&document, "fatal", false);
                return;
            }
        };

        let has_save = session.resumable().is_some();
        if let Some(snapshot) = session.resumable() {
            set_text(
                &document,
                "continue-depth",
                &format_depth(session.calibration.raw_to_cm(snapshot.depth)),
            );
            set_hidden(&document, "continue-prompt", false);
            log::info!("Found saved run at {:.0} raw units", snapshot.depth);
        }

        let app = Rc::new(RefCell::new(App::new(session)));

        setup_input_handlers(&document, app.clone());
        setup_continue_prompt(&document, app.clone());
        setup_calibration_overlay(&document, app.clone());

        if !has_save {
            set_hidden(&document, "hud", false);
        }

        request_animation_frame(app);

        log::info!("Deepscroll running!");
    }

    fn setup_input_handlers(document: &Document, app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();

        // Wheel: normalize delta modes to pixels; positive = deeper
        {
            let app = app.clone();
            let inner_height = window
                .inner_height()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(800.0) as f32;
            let closure = Closure::<dyn FnMut(_)>::new(move |event: WheelEvent| {
                event.prevent_default();
                let scale = match event.delta_mode() {
                    WheelEvent::DOM_DELTA_LINE => LINE_HEIGHT_PX,
                    WheelEvent::DOM_DELTA_PAGE => inner_height,
                    _ => 1.0,
                };
                app.borrow_mut().pending_delta += event.delta_y() as f32 * scale;
            });
            let _ = window
                .add_event_listener_with_callback("wheel", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch: dragging up scrolls deeper
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                if let Some(touch) = event.touches().get(0) {
                    app.borrow_mut().last_touch_y = Some(touch.client_y() as f32);
                }
            });
            let _ = window
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let y = touch.client_y() as f32;
                    let mut a = app.borrow_mut();
                    if let Some(last) = a.last_touch_y {
                        a.pending_delta += last - y;
                    }
                    a.last_touch_y = Some(y);
                }
            });
            let _ = window
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                app.borrow_mut().last_touch_y = None;
            });
            let _ = window
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let app = app.clone();
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                match event.key().as_str() {
                    "i" | "I" => {
                        let mut a = app.borrow_mut();
                        let enabled = !a.session.settings.inertia_enabled;
                        a.session.set_inertia(enabled);
                        log::info!("Inertia: {enabled}");
                    }
                    "c" | "C" => {
                        let visible = document
                            .get_element_by_id("calibration-overlay")
                            .map(|el| el.get_attribute("class").as_deref() != Some("hidden"))
                            .unwrap_or(false);
                        set_hidden(&document, "calibration-overlay", visible);
                        if !visible {
                            open_calibration(&document, &app);
                        }
                    }
                    _ => {}
                }
            });
            let _ = web_sys::window()
                .unwrap()
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Size the reference element for the current calibration and scale
    fn apply_reference_size(document: &Document, app: &App) {
        if let Some(el) = document.get_element_by_id("cal-reference") {
            if let Ok(el) = el.dyn_into::<HtmlElement>() {
                let px = Calibration::displayed_px(app.cal_base_px, app.cal_scale);
                let _ = el.style().set_property("width", &format!("{px}px"));
            }
        }
    }

    fn open_calibration(document: &Document, app: &Rc<RefCell<App>>) {
        let mut a = app.borrow_mut();
        // Base size: the reference at the currently-believed factor
        a.cal_base_px = a.cal_reference.width_cm() * a.session.calibration.px_per_cm();
        a.cal_scale = 1.0;
        if let Some(slider) = document.get_element_by_id("cal-scale") {
            if let Ok(slider) = slider.dyn_into::<HtmlInputElement>() {
                slider.set_value("1.0");
            }
        }
        set_text(document, "cal-label", a.cal_reference.label());
        apply_reference_size(document, &a);
    }

    fn setup_calibration_overlay(document: &Document, app: Rc<RefCell<App>>) {
        // Scale slider
        if let Some(slider) = document.get_element_by_id("cal-scale") {
            let app = app.clone();
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                let Some(target) = event.target() else { return };
                let Ok(slider) = target.dyn_into::<HtmlInputElement>() else {
                    return;
                };
                if let Ok(scale) = slider.value().parse::<f32>() {
                    let mut a = app.borrow_mut();
                    a.cal_scale = scale;
                    apply_reference_size(&document, &a);
                }
            });
            let _ = slider.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Confirm: the displayed size now matches the physical object
        if let Some(btn) = document.get_element_by_id("cal-confirm") {
            let app = app.clone();
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut a = app.borrow_mut();
                let displayed = Calibration::displayed_px(a.cal_base_px, a.cal_scale);
                let known_cm = a.cal_reference.width_cm();
                if a.session.calibrate(displayed, known_cm) {
                    set_hidden(&document, "calibration-overlay", true);
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Reset to the auto estimate
        if let Some(btn) = document.get_element_by_id("cal-reset") {
            let app = app.clone();
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                app.borrow_mut().session.reset_calibration();
                open_calibration(&document, &app);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_continue_prompt(document: &Document, app: Rc<RefCell<App>>) {
        // Continue button: rehydrate and keep going
        if let Some(btn) = document.get_element_by_id("continue-btn") {
            let app = app.clone();
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let now = js_sys::Date::now();
                app.borrow_mut().session.resume(now);
                set_hidden(&document, "continue-prompt", true);
                set_hidden(&document, "hud", false);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // New run button: discard the snapshot and start grounded
        if let Some(btn) = document.get_element_by_id("new-run-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                app.borrow_mut().session.discard_snapshot();
                let document = web_sys::window().unwrap().document().unwrap();
                set_hidden(&document, "continue-prompt", true);
                set_hidden(&document, "hud", false);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();

            // While the resume decision is pending, hold the simulation
            // and drop any scroll input instead of letting it pile up
            if a.session.resumable().is_some() {
                a.pending_delta = 0.0;
            } else {
                let delta = std::mem::take(&mut a.pending_delta);
                let events = a.session.frame(delta, time);

                let document = web_sys::window().unwrap().document().unwrap();
                update_hud(&document, &a, &events);
            }
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_app::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use deepscroll::consts::NOMINAL_DT;
    use deepscroll::persistence::MemoryStorage;
    use deepscroll::session::Session;

    env_logger::init();
    log::info!("Deepscroll (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    // Headless smoke run: dive, coast, get pulled back up
    let mut session =
        Session::new(MemoryStorage::new(), 38.0).expect("achievement table is valid");
    let mut now = 0.0f64;
    for i in 0..600 {
        let delta = if i < 120 { 40.0 } else { 0.0 };
        session.advance(delta, now, NOMINAL_DT);
        now += 1000.0 * NOMINAL_DT as f64;
    }

    println!(
        "depth {:.1} cm, travelled {:.1} cm, best {:.1} cm, splits {}",
        session.depth_cm(),
        session.state.stats.total_cm,
        session.best.cm(),
        session.state.milestones.splits.len()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
