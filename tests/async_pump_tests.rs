use std::time::Duration;

use audio_route_switch::audio::AudioDevice;
use audio_route_switch::notifications::BluetoothHeadsetEvent;

mod test_utils;
use test_utils::{RecordingBluetoothListener, SessionBuilder, headset};

#[tokio::test]
async fn test_next_event_applies_queued_callback() {
    let mut session = SessionBuilder::new().started();
    session.platform.wired.plug("Jack");

    session.switch.next_event().await;

    assert_eq!(session.selected(), Some(AudioDevice::wired_headset("Jack")));
}

#[tokio::test]
async fn test_callback_from_another_thread_wakes_the_pump() {
    let mut session = SessionBuilder::new().started();
    let bluetooth = session.platform.bluetooth.clone();

    let connect = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        bluetooth.connect("MyHeadset", "AA:BB");
    });
    tokio::time::timeout(Duration::from_secs(2), session.switch.next_event())
        .await
        .unwrap();
    connect.await.unwrap();

    assert_eq!(session.selected(), Some(headset("MyHeadset", "AA:BB")));
}

#[tokio::test]
async fn test_next_event_wakes_for_sco_deadline() {
    let mut session = SessionBuilder::new()
        .manual_sco()
        .sco_timeout(Duration::from_millis(50))
        .bluetooth_headset("MyHeadset", "AA:BB")
        .started();
    let bluetooth = RecordingBluetoothListener::default();
    bluetooth.install(&mut session.switch);
    session.switch.activate().unwrap();

    tokio::time::timeout(Duration::from_secs(2), session.switch.next_event())
        .await
        .unwrap();

    assert_eq!(session.selected(), Some(AudioDevice::Earpiece));
    assert_eq!(
        bluetooth.events(),
        vec![BluetoothHeadsetEvent::ActivationError(headset(
            "MyHeadset", "AA:BB"
        ))]
    );
}

#[test]
fn test_pump_from_blocking_context() {
    let mut session = SessionBuilder::new().started();
    session.platform.bluetooth.connect("MyHeadset", "AA:BB");
    session.platform.bluetooth.disconnect("AA:BB");

    tokio_test::block_on(async {
        session.switch.next_event().await;
        session.switch.next_event().await;
    });

    assert_eq!(session.selected(), Some(AudioDevice::Earpiece));
    assert_eq!(session.listener.count(), 3);
}
