#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::{Rc, Weak};

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use web_time::Duration;

    use crate::clock::{TestClock, set_clock};
    use crate::reactive;
    use crate::scope::*;
    use crate::*;

    fn leaf(text: &str) -> View {
        View::new(
            0,
            ViewKind::Text {
                text: text.into(),
                color: Color::BLACK,
                font_size: 14.0,
                align: TextAlign::Start,
            },
        )
    }

    #[test]
    fn test_state_basic() {
        let state = mutable_state_of(42);
        assert_eq!(state.get(), 42);

        state.set(100);
        assert_eq!(state.get(), 100);

        state.update(|v| *v += 1);
        assert_eq!(state.get(), 101);
    }

    #[test]
    fn test_state_subscription() {
        let state = mutable_state_of(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_clone = seen.clone();
        let sub = state.subscribe(move |v| seen_clone.borrow_mut().push(*v));

        state.set(1);
        state.set(1); // equal write is not a change
        state.set(2);
        state.unsubscribe(sub);
        state.set(3);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_scope_explicit_dispose() {
        let order = Rc::new(RefCell::new(Vec::new()));

        let scope = Scope::new();
        for i in 0..3 {
            let order = order.clone();
            scope.add_disposer(move || order.borrow_mut().push(i));
        }
        assert!(order.borrow().is_empty());

        scope.dispose();
        scope.dispose();
        assert_eq!(*order.borrow(), vec![2, 1, 0]);

        let late = Rc::new(Cell::new(false));
        let late_clone = late.clone();
        scope.add_disposer(move || late_clone.set(true));
        assert!(late.get());
    }

    #[test]
    fn test_first_pass_then_idle() {
        let composition = Composition::new(|| leaf("hello"));
        assert!(composition.needs_recompose());
        assert_eq!(composition.recompose(), 1);
        assert!(!composition.needs_recompose());
        assert_eq!(composition.recompose(), 0);
        assert_eq!(composition.tree().collect_text(), vec!["hello"]);
    }

    #[test]
    fn test_child_scope_recomposes_alone() {
        let color = mutable_state_of(Color::RED);
        let composition = Composition::new({
            let color = color.clone();
            move || {
                let color = color.clone();
                let row = compose_scope("row", (), move || {
                    leaf(&channel_string(color.observe().red))
                });
                View::new(0, ViewKind::Column).with_children(vec![leaf("title"), row])
            }
        });
        composition.recompose();
        assert_eq!(composition.tree().collect_text(), vec!["title", "1.0"]);
        assert_eq!(reactive::observer_count(color.id()), 1);

        color.set(Color::BLUE);
        assert_eq!(composition.recompose(), 1);
        assert_eq!(composition.recompositions("root"), 1);
        assert_eq!(composition.recompositions("root/row"), 2);
        assert_eq!(composition.tree().collect_text(), vec!["title", "0.0"]);
    }

    #[test]
    fn test_unobserved_write_recomposes_nothing() {
        let observed = mutable_state_of(0);
        let ignored = mutable_state_of(0);
        let composition = Composition::new({
            let observed = observed.clone();
            let ignored = ignored.clone();
            move || {
                // an untracked read does not subscribe
                let _ = ignored.get();
                leaf(&observed.observe().to_string())
            }
        });
        composition.recompose();

        ignored.set(5);
        assert!(!composition.needs_recompose());
        assert_eq!(composition.recompose(), 0);

        observed.set(1);
        assert_eq!(composition.recompose(), 1);
    }

    #[test]
    fn test_inputs_gate_child_reruns() {
        let count = mutable_state_of(0);
        let unrelated = mutable_state_of(0);
        let composition = Composition::new({
            let count = count.clone();
            let unrelated = unrelated.clone();
            move || {
                let n = count.observe();
                let _ = unrelated.observe();
                let child = compose_scope("child", n, move || leaf(&format!("n = {n}")));
                View::new(0, ViewKind::Column).with_children(vec![child])
            }
        });
        composition.recompose();

        unrelated.set(1);
        composition.recompose();
        assert_eq!(composition.recompositions("root"), 2);
        assert_eq!(composition.recompositions("root/child"), 1);

        count.set(1);
        composition.recompose();
        assert_eq!(composition.recompositions("root/child"), 2);
        assert_eq!(composition.tree().collect_text(), vec!["n = 1"]);
    }

    #[test]
    fn test_removed_scope_is_disposed() {
        let show = mutable_state_of(true);
        let disposed = Rc::new(Cell::new(false));
        let remembered: Rc<RefCell<Option<Weak<i32>>>> = Rc::new(RefCell::new(None));

        let composition = Composition::new({
            let show = show.clone();
            let disposed = disposed.clone();
            let remembered = remembered.clone();
            move || {
                if !show.observe() {
                    return View::new(0, ViewKind::Column);
                }
                let disposed = disposed.clone();
                let remembered = remembered.clone();
                compose_scope("child", (), move || {
                    let value = remember(|| 7);
                    *remembered.borrow_mut() = Some(Rc::downgrade(&value));
                    let disposed = disposed.clone();
                    scoped_effect(move || on_unmount(move || disposed.set(true)));
                    View::new(0, ViewKind::Box)
                })
            }
        });
        composition.recompose();
        assert_eq!(composition.scope_count(), 2);
        assert!(remembered.borrow().as_ref().and_then(|w| w.upgrade()).is_some());

        show.set(false);
        composition.recompose();
        assert!(disposed.get());
        assert!(remembered.borrow().as_ref().and_then(|w| w.upgrade()).is_none());
        assert_eq!(composition.scope_count(), 1);
        assert_eq!(composition.recompositions("root/child"), 0);
    }

    #[test]
    fn test_remember_survives_passes() {
        let tick = mutable_state_of(0);
        let inits = Rc::new(Cell::new(0));
        let composition = Composition::new({
            let tick = tick.clone();
            let inits = inits.clone();
            move || {
                let _ = tick.observe();
                let inits = inits.clone();
                let keyed = remember_with_key("k", || 1);
                let state = remember_state(move || {
                    inits.set(inits.get() + 1);
                    "kept".to_string()
                });
                leaf(&format!("{} {}", state.get(), keyed))
            }
        });
        composition.recompose();
        tick.set(1);
        composition.recompose();
        tick.set(2);
        composition.recompose();
        assert_eq!(inits.get(), 1);
        assert_eq!(composition.tree().collect_text(), vec!["kept 1"]);
    }

    #[test]
    fn test_remember_outside_composition_is_fresh() {
        let a = remember_with_key("test", || 42);
        let b = remember_with_key("test", || 100);
        assert_eq!(*a, 42);
        assert_eq!(*b, 100);
    }

    #[test]
    fn test_side_effect_runs_after_commit() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let composition = Composition::new({
            let log = log.clone();
            move || {
                log.borrow_mut().push("compose");
                let effect_log = log.clone();
                side_effect(move || effect_log.borrow_mut().push("effect"));
                log.borrow_mut().push("output");
                View::new(0, ViewKind::Box)
            }
        });
        composition.recompose();
        assert_eq!(*log.borrow(), vec!["compose", "output", "effect"]);

        // idle pass: no new effect
        composition.recompose();
        assert_eq!(log.borrow().len(), 3);

        composition.invalidate_all();
        composition.recompose();
        assert_eq!(log.borrow().len(), 6);
        assert_eq!(log.borrow()[5], "effect");
    }

    #[test]
    fn test_side_effect_write_does_not_feed_back() {
        let counter = Rc::new(Cell::new(0));
        let shown = mutable_state_of(0);
        let composition = Composition::new({
            let counter = counter.clone();
            let shown = shown.clone();
            move || {
                let _ = shown.observe();
                let counter = counter.clone();
                side_effect(move || counter.set(counter.get() + 1));
                View::new(0, ViewKind::Box)
            }
        });
        composition.recompose();
        assert_eq!(counter.get(), 1);
        assert!(!composition.needs_recompose());

        shown.set(1);
        composition.recompose();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_disposable_effect_keys() {
        let key = mutable_state_of(1);
        let log = Rc::new(RefCell::new(Vec::new()));
        let composition = Composition::new({
            let key = key.clone();
            let log = log.clone();
            move || {
                let k = key.observe();
                let log = log.clone();
                disposable_effect(k, move || {
                    log.borrow_mut().push(format!("start {k}"));
                    on_unmount(move || log.borrow_mut().push(format!("stop {k}")))
                });
                View::new(0, ViewKind::Box)
            }
        });
        composition.recompose();
        key.set(2);
        composition.recompose();
        composition.invalidate_all();
        composition.recompose();
        assert_eq!(*log.borrow(), vec!["start 1", "stop 1", "start 2"]);

        drop(composition);
        assert_eq!(log.borrow().last().map(String::as_str), Some("stop 2"));
    }

    #[test]
    fn test_scope_keeps_locals_on_rerun() {
        let tick = mutable_state_of(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let composition = Composition::new({
            let tick = tick.clone();
            let seen = seen.clone();
            move || {
                let tick = tick.clone();
                let seen = seen.clone();
                with_theme(Theme::dark(), move || {
                    compose_scope("themed", (), move || {
                        let _ = tick.observe();
                        seen.borrow_mut().push(theme().primary);
                        View::new(0, ViewKind::Box)
                    })
                })
            }
        });
        composition.recompose();
        tick.set(1);
        composition.recompose();
        assert_eq!(*seen.borrow(), vec![Theme::dark().primary; 2]);
    }

    #[test]
    fn test_task_scope_with_test_clock() {
        let clock = TestClock::new();
        set_clock(Rc::new(clock.clone()));

        let done = Rc::new(Cell::new(false));
        let composition = Composition::new({
            let done = done.clone();
            move || {
                let tasks = remember_task_scope();
                let started = remember(|| Cell::new(false));
                if !started.replace(true) {
                    let done = done.clone();
                    tasks.launch(async move {
                        delay(Duration::from_secs(4)).await;
                        done.set(true);
                    });
                }
                View::new(0, ViewKind::Box)
            }
        });
        composition.recompose();
        assert_eq!(composition.poll_tasks(), 1);

        clock.advance(Duration::from_secs(3));
        assert_eq!(composition.poll_tasks(), 1);
        assert!(!done.get());

        clock.advance(Duration::from_secs(1));
        assert_eq!(composition.poll_tasks(), 0);
        assert!(done.get());
    }

    #[test]
    fn test_task_scope_cancelled_with_scope() {
        struct Flag(Rc<Cell<bool>>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }

        let dropped = Rc::new(Cell::new(false));
        let composition = Composition::new({
            let dropped = dropped.clone();
            move || {
                let tasks = remember_task_scope();
                let flag = Flag(dropped.clone());
                tasks.launch(async move {
                    let _flag = flag;
                    std::future::pending::<()>().await;
                });
                View::new(0, ViewKind::Box)
            }
        });
        composition.recompose();
        composition.poll_tasks();
        assert!(!dropped.get());

        drop(composition);
        assert!(dropped.get());
    }

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex("#FF0000");
        assert_eq!(c, Color::RED);

        let c_alpha = Color::from_hex("#00000000");
        assert_eq!(c_alpha, Color::TRANSPARENT);

        assert_eq!(Color::from_hex("nope"), Color::BLACK);
        assert_eq!(Color::from_hex("#6200EE").to_rgba8(), [0x62, 0x00, 0xEE, 0xFF]);
    }

    #[test]
    fn test_color_new_clamps_channels() {
        let c = Color::new(1.5, -0.2, f32::NAN, 0.5);
        assert_eq!((c.red, c.green, c.blue, c.alpha), (1.0, 0.0, 0.0, 0.5));
        assert_eq!(Color::from_rgb(2.0, 0.5, 0.5).red, 1.0);
    }

    #[test]
    fn test_random_opaque_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let c = Color::random_opaque(&mut rng);
            for ch in [c.red, c.green, c.blue] {
                assert!((0.0..=1.0).contains(&ch));
            }
            assert_eq!(c.alpha, 1.0);
        }
    }

    #[test]
    fn test_channel_string() {
        assert_eq!(channel_string(1.0), "1.0");
        assert_eq!(channel_string(0.0), "0.0");
        assert_eq!(channel_string(0.25), "0.25");
    }

    #[test]
    fn test_channel_string_small_values_keep_decimal_point() {
        assert_eq!(channel_string(0.00005), "5.0E-5");
        assert_eq!(channel_string(0.000015), "1.5E-5");
        assert_eq!(channel_string(0.0001), "0.0001");
        for v in [0.00005_f32, 0.000015, 1e-7] {
            let s = channel_string(v);
            assert!(s.contains('.'), "{s}");
            assert_eq!(s.parse::<f32>().unwrap(), v);
        }
    }

    #[test]
    fn test_annotated_fragments() {
        let s = build_annotated_string(|b| {
            b.with_style(SpanStyle::new().color(Color::BLUE), |b| {
                b.append("J");
                b.with_style(SpanStyle::new().color(Color::RED), |b| {
                    b.append("e");
                });
            });
            b.append("tpack");
        });
        let frags = s.fragments();
        assert_eq!(frags.len(), 3);
        assert_eq!(frags[0], ("J", SpanStyle::new().color(Color::BLUE)));
        assert_eq!(frags[1], ("e", SpanStyle::new().color(Color::RED)));
        assert_eq!(frags[2], ("tpack", SpanStyle::default()));
    }

    #[test]
    fn test_resource_lookup() {
        let mut table = ResourceTable::new();
        assert!(matches!(
            table.register_image("empty", 0, 1, vec![]),
            Err(Error::InvalidResource { .. })
        ));
        table.register_image("header", 2, 1, vec![0; 8]).unwrap();

        let table = Rc::new(table);
        with_resources(table, || {
            assert_eq!(painter_resource("header").unwrap().width, 2);
            assert!(matches!(
                painter_resource("missing"),
                Err(Error::ResourceNotFound(id)) if id == "missing"
            ));
        });
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect {
            x: 10.0,
            y: 10.0,
            w: 100.0,
            h: 50.0,
        };

        assert!(rect.contains(Vec2 { x: 50.0, y: 30.0 }));
        assert!(!rect.contains(Vec2 { x: 5.0, y: 30.0 }));
        assert!(!rect.contains(Vec2 { x: 50.0, y: 70.0 }));
    }
}
