//! Integration tests for the two input services sharing one hub.
//!
//! These tests exercise `InputHub` + `KeyStateTracker` + `ActivityMonitor`
//! end-to-end through the public API only, with synthetic timelines.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use inputwatch_core::{
    ActivityMonitor, ActivityState, InputHub, KeyStateTracker, MouseButton, RawInputEvent,
};

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[test]
fn test_chord_sequence_through_hub() {
    // Arrange
    let hub = InputHub::new();
    let keys = Rc::new(KeyStateTracker::new());
    let _attachment = keys.start(&hub).expect("start key tracker");
    let t0 = Instant::now();

    // Act – press A, then Shift
    hub.publish(RawInputEvent::key_down("A"), t0);
    hub.publish(RawInputEvent::key_down("Shift"), t0 + ms(5));

    // Assert
    assert!(keys.is_chord_pressed(&["A", "Shift"]));
    assert!(keys.is_chord_pressed_exclusively(&["A", "Shift"]));
    assert!(keys.is_chord_pressed_exclusively(&["Shift", "A"]));

    // Act – add C
    hub.publish(RawInputEvent::key_down("C"), t0 + ms(10));

    // Assert – still pressed, no longer exclusive
    assert!(keys.is_chord_pressed(&["A", "Shift"]));
    assert!(!keys.is_chord_pressed_exclusively(&["A", "Shift"]));
}

#[test]
fn test_key_pressed_and_key_up_are_complementary_for_every_key() {
    let hub = InputHub::new();
    let keys = Rc::new(KeyStateTracker::new());
    let _attachment = keys.start(&hub).expect("start");
    let t0 = Instant::now();

    let script = [
        RawInputEvent::key_down("a"),
        RawInputEvent::key_down("b"),
        RawInputEvent::key_up("a"),
        RawInputEvent::key_up("z"),
        RawInputEvent::key_down("b"),
    ];
    for event in script {
        hub.publish(event, t0);
        for key in ["a", "b", "z", "never-seen"] {
            assert_eq!(keys.is_key_pressed(key), !keys.is_key_up(key), "key {key}");
        }
    }
}

#[test]
fn test_services_are_independent_consumers_of_the_same_stream() {
    // Arrange
    let hub = InputHub::new();
    let keys = Rc::new(KeyStateTracker::new());
    let activity = Rc::new(ActivityMonitor::with_timeout(ms(2000)));
    let _keys_attachment = keys.start(&hub).expect("start keys");
    let _activity_attachment = activity.start(&hub).expect("start activity");

    let log = Rc::new(RefCell::new(Vec::<String>::new()));
    let down_log = Rc::clone(&log);
    keys.on_key_down()
        .subscribe(move |key: &str| down_log.borrow_mut().push(format!("down:{key}")));
    let up_log = Rc::clone(&log);
    keys.on_key_up()
        .subscribe(move |key: &str| up_log.borrow_mut().push(format!("up:{key}")));
    let change_log = Rc::clone(&log);
    activity
        .on_change_activity_state()
        .subscribe(move |state| change_log.borrow_mut().push(format!("state:{state}")));

    let t0 = Instant::now();

    // Act
    hub.publish(RawInputEvent::key_down("Enter"), t0);
    hub.publish(RawInputEvent::key_up("Enter"), t0 + ms(80));
    hub.publish(
        RawInputEvent::MouseDown {
            button: MouseButton::Left,
        },
        t0 + ms(500),
    );
    let change = activity.poll(t0 + ms(2500));

    // Assert – key tracker ignored the click; activity ignored the key-down
    assert_eq!(change, Some(ActivityState::Inactive));
    assert_eq!(
        *log.borrow(),
        vec![
            "down:Enter",
            "up:Enter",
            "state:active",
            "state:inactive"
        ]
    );
}

#[test]
fn test_three_spaced_signals_produce_no_intermediate_inactivity() {
    // Arrange
    let hub = InputHub::new();
    let activity = Rc::new(ActivityMonitor::with_timeout(ms(2000)));
    let _attachment = activity.start(&hub).expect("start");

    let pulses = Rc::new(RefCell::new(0u32));
    let pulse_counter = Rc::clone(&pulses);
    activity
        .on_activity()
        .subscribe(move |_| *pulse_counter.borrow_mut() += 1);
    let changes = Rc::new(RefCell::new(Vec::new()));
    let change_recorder = Rc::clone(&changes);
    activity
        .on_change_activity_state()
        .subscribe(move |state| change_recorder.borrow_mut().push(*state));

    let t0 = Instant::now();

    // Act – signals at 0, 1000, 2000 with a timer check every 100 ms
    for step in 0..=25u64 {
        let now = t0 + ms(step * 100);
        activity.poll(now);
        if step % 10 == 0 {
            hub.publish(RawInputEvent::MouseMove { x: step as i32, y: 0 }, now);
        }
    }

    // Assert – only the initial activation so far
    assert_eq!(*pulses.borrow(), 3);
    assert_eq!(*changes.borrow(), vec![ActivityState::Active]);

    // The quiet period after the last signal ends at t=4000
    assert_eq!(activity.poll(t0 + ms(3990)), None);
    assert_eq!(activity.poll(t0 + ms(4000)), Some(ActivityState::Inactive));
}

#[test]
fn test_detached_services_stop_observing() {
    let hub = InputHub::new();
    let keys = Rc::new(KeyStateTracker::new());
    let activity = Rc::new(ActivityMonitor::new());
    let keys_attachment = keys.start(&hub).expect("start keys");
    let activity_attachment = activity.start(&hub).expect("start activity");

    keys_attachment.detach();
    activity_attachment.detach();
    hub.publish(RawInputEvent::key_down("q"), Instant::now());
    hub.publish(RawInputEvent::MouseMove { x: 1, y: 1 }, Instant::now());

    assert!(keys.is_key_up("q"));
    assert_eq!(activity.activity_state(), None);
    assert_eq!(hub.listener_count(), 0);
}

#[test]
fn test_unlisted_button_press_rearms_inactivity_timer() {
    // Arrange
    let hub = InputHub::new();
    let activity = Rc::new(ActivityMonitor::with_timeout(ms(1000)));
    let _attachment = activity.start(&hub).expect("start");
    let t0 = Instant::now();
    hub.publish(RawInputEvent::MouseMove { x: 0, y: 0 }, t0);
    let click: RawInputEvent =
        serde_json::from_str(r#"{"type":"mousedown","button":"auxiliary"}"#).expect("parse");

    // Act – the click lands just before the deadline
    hub.publish(click, t0 + ms(900));

    // Assert
    assert_eq!(
        activity.next_deadline(),
        Some(t0 + ms(1900)),
        "click should restart the quiet period"
    );
    assert_eq!(activity.poll(t0 + ms(1000)), None);
    assert!(activity.is_active());
    assert_eq!(
        activity.poll(t0 + ms(1900)),
        Some(ActivityState::Inactive)
    );
}

#[test]
fn test_service_restarts_after_attachment_is_dropped() {
    let hub = InputHub::new();
    let activity = Rc::new(ActivityMonitor::new());

    drop(activity.start(&hub).expect("first start"));
    assert!(!activity.is_attached());

    let _attachment = activity
        .start(&hub)
        .expect("restart after dropped attachment");
    hub.publish(
        RawInputEvent::MouseDown {
            button: MouseButton::Right,
        },
        Instant::now(),
    );
    assert!(activity.is_active());
}
