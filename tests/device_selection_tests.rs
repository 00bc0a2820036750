use audio_route_switch::audio::{AudioDevice, DeviceKind};

mod test_utils;
use test_utils::{SessionBuilder, TestSession, headset};

#[test]
fn test_available_devices_follow_connects_and_disconnects() {
    let mut session = SessionBuilder::new().started();
    assert_eq!(
        session.available(),
        vec![AudioDevice::Earpiece, AudioDevice::Speakerphone]
    );

    session.platform.bluetooth.connect("MyHeadset", "AA:BB");
    session.platform.wired.plug("Jack");
    session.pump();
    assert_eq!(
        session.available(),
        vec![
            headset("MyHeadset", "AA:BB"),
            AudioDevice::wired_headset("Jack"),
            AudioDevice::Earpiece,
            AudioDevice::Speakerphone,
        ]
    );

    session.platform.bluetooth.disconnect("AA:BB");
    session.pump();
    assert_eq!(
        session.available(),
        vec![
            AudioDevice::wired_headset("Jack"),
            AudioDevice::Earpiece,
            AudioDevice::Speakerphone,
        ]
    );

    session.platform.wired.unplug();
    session.pump();
    assert_eq!(
        session.available(),
        vec![AudioDevice::Earpiece, AudioDevice::Speakerphone]
    );
}

#[test]
fn test_handset_without_earpiece_only_has_speakerphone() {
    let session = SessionBuilder::new().without_earpiece().started();

    assert_eq!(session.available(), vec![AudioDevice::Speakerphone]);
    assert_eq!(session.selected(), Some(AudioDevice::Speakerphone));
}

#[test]
fn test_speakerphone_first_order_selects_speakerphone() {
    let session = SessionBuilder::new()
        .preferred(&[
            DeviceKind::Speakerphone,
            DeviceKind::Earpiece,
            DeviceKind::WiredHeadset,
            DeviceKind::BluetoothHeadset,
        ])
        .started();

    assert_eq!(session.selected(), Some(AudioDevice::Speakerphone));
}

#[test]
fn test_wired_plug_does_not_displace_higher_priority_speakerphone() {
    let mut session = SessionBuilder::new()
        .preferred(&[
            DeviceKind::Speakerphone,
            DeviceKind::Earpiece,
            DeviceKind::WiredHeadset,
            DeviceKind::BluetoothHeadset,
        ])
        .started();

    session.platform.wired.plug("Jack");
    session.pump();

    assert_eq!(session.selected(), Some(AudioDevice::Speakerphone));
    assert!(
        session
            .available()
            .contains(&AudioDevice::wired_headset("Jack"))
    );
    // The list changed, so the listener still hears about it
    assert_eq!(session.listener.count(), 2);
}

#[test]
fn test_bluetooth_headset_is_selected_then_released() {
    let mut session = SessionBuilder::new().started();

    session.platform.bluetooth.connect("MyHeadset", "AA:BB");
    session.pump();
    assert_eq!(session.selected(), Some(headset("MyHeadset", "AA:BB")));

    session.platform.bluetooth.disconnect("AA:BB");
    session.pump();
    assert_eq!(session.selected(), Some(AudioDevice::Earpiece));

    assert_eq!(
        session.listener.selections(),
        vec![
            Some(AudioDevice::Earpiece),
            Some(headset("MyHeadset", "AA:BB")),
            Some(AudioDevice::Earpiece),
        ]
    );
}

#[test]
fn test_head_of_order_wins_when_everything_is_available() {
    let orders = [
        vec![],
        vec![DeviceKind::WiredHeadset],
        vec![DeviceKind::Earpiece, DeviceKind::Speakerphone],
        vec![DeviceKind::Speakerphone],
    ];

    for preferred in orders {
        let session = SessionBuilder::new()
            .preferred(&preferred)
            .bluetooth_headset("MyHeadset", "AA:BB")
            .wired_headset("Jack")
            .started();

        let head = session.switch.preferred_order().head();
        assert_eq!(session.selected().map(|d| d.kind()), Some(head));
        assert_eq!(session.available()[0].kind(), head);
    }
}

#[test]
fn test_most_recently_connected_headset_wins() {
    let mut session = SessionBuilder::new().started();

    session.platform.bluetooth.connect("First", "AA:AA");
    session.platform.bluetooth.connect("Second", "BB:BB");
    session.pump();

    assert_eq!(session.selected(), Some(headset("Second", "BB:BB")));
}

#[test]
fn test_pinned_selection_survives_recomputation() {
    let mut session = SessionBuilder::new().started();

    session.switch.select_device(&AudioDevice::Speakerphone);
    assert_eq!(session.selected(), Some(AudioDevice::Speakerphone));

    session.platform.wired.plug("Jack");
    session.platform.bluetooth.connect("MyHeadset", "AA:BB");
    session.pump();

    assert_eq!(session.selected(), Some(AudioDevice::Speakerphone));
}

#[test]
fn test_select_device_notifies_listener() {
    let mut session = SessionBuilder::new().wired_headset("Jack").started();
    assert_eq!(session.listener.count(), 1);

    session.switch.select_device(&AudioDevice::Speakerphone);

    assert_eq!(session.listener.count(), 2);
    assert_eq!(
        session.listener.last(),
        Some((
            vec![
                AudioDevice::wired_headset("Jack"),
                AudioDevice::Earpiece,
                AudioDevice::Speakerphone,
            ],
            Some(AudioDevice::Speakerphone)
        ))
    );

    // Selecting the current device again changes nothing
    session.switch.select_device(&AudioDevice::Speakerphone);
    assert_eq!(session.listener.count(), 2);
}

#[test]
fn test_selecting_unavailable_device_is_ignored() {
    let mut session = SessionBuilder::new().started();
    let before = session.listener.count();

    session
        .switch
        .select_device(&AudioDevice::wired_headset("Jack"));
    session.switch.select_device(&headset("Ghost", "00:00"));

    assert_eq!(session.selected(), Some(AudioDevice::Earpiece));
    assert_eq!(session.listener.count(), before);
}

#[test]
fn test_pin_is_dropped_when_device_goes_away() {
    let mut session = SessionBuilder::new()
        .bluetooth_headset("MyHeadset", "AA:BB")
        .wired_headset("Jack")
        .started();

    session
        .switch
        .select_device(&AudioDevice::wired_headset("Jack"));
    assert_eq!(session.selected(), Some(AudioDevice::wired_headset("Jack")));

    session.platform.wired.unplug();
    session.pump();
    assert_eq!(session.selected(), Some(headset("MyHeadset", "AA:BB")));

    // Automatic selection again: a re-plugged headset does not win over Bluetooth
    session.platform.wired.plug("Jack");
    session.pump();
    assert_eq!(session.selected(), Some(headset("MyHeadset", "AA:BB")));
}

#[test]
fn test_pinned_headset_hands_over_to_remaining_headset() {
    let mut session = SessionBuilder::new()
        .preferred(&[DeviceKind::Speakerphone])
        .bluetooth_headset("First", "AA:AA")
        .bluetooth_headset("Second", "BB:BB")
        .started();
    assert_eq!(session.selected(), Some(AudioDevice::Speakerphone));

    session.switch.select_device(&headset("First", "AA:AA"));
    session.platform.bluetooth.disconnect("AA:AA");
    session.pump();
    assert_eq!(session.selected(), Some(headset("Second", "BB:BB")));

    session.platform.bluetooth.disconnect("BB:BB");
    session.pump();
    assert_eq!(session.selected(), Some(AudioDevice::Speakerphone));
}

#[test]
fn test_clear_selection_returns_to_priority() {
    let mut session = SessionBuilder::new().started();
    session.switch.select_device(&AudioDevice::Speakerphone);

    session.switch.clear_selection();

    assert_eq!(session.selected(), Some(AudioDevice::Earpiece));
    assert_eq!(session.listener.count(), 3);
}

#[test]
fn test_repeated_events_do_not_notify() {
    let mut session = SessionBuilder::new()
        .bluetooth_headset("MyHeadset", "AA:BB")
        .wired_headset("Jack")
        .started();
    assert_eq!(session.listener.count(), 1);

    session.platform.bluetooth.connect("MyHeadset", "AA:BB");
    session.platform.wired.plug("Jack");
    session.platform.bluetooth.disconnect("CC:DD");
    session.pump();

    assert_eq!(session.listener.count(), 1);
}

#[test]
fn test_selection_always_belongs_to_available_list() {
    let mut session = SessionBuilder::new().started();
    let steps: Vec<Box<dyn Fn(&TestSession)>> = vec![
        Box::new(|s: &TestSession| s.platform.bluetooth.connect("First", "AA:AA")),
        Box::new(|s: &TestSession| s.platform.wired.plug("Jack")),
        Box::new(|s: &TestSession| s.platform.bluetooth.connect("Second", "BB:BB")),
        Box::new(|s: &TestSession| s.platform.bluetooth.disconnect("AA:AA")),
        Box::new(|s: &TestSession| s.platform.wired.unplug()),
        Box::new(|s: &TestSession| s.platform.bluetooth.disconnect("BB:BB")),
    ];

    for step in steps {
        step(&session);
        session.pump();

        let selected = session.selected().expect("a device is always available");
        assert!(session.available().contains(&selected));
    }
}
