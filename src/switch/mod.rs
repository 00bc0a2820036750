//! The public audio switch: lifecycle, selection and listener registration.
//!
//! All platform callbacks are funnelled into one channel and applied by the owner of the
//! [`AudioSwitch`], one event at a time. Hosts either pump the channel synchronously with
//! [`AudioSwitch::process_pending_events`] or await [`AudioSwitch::next_event`] from an
//! async loop. Mutating operations drain pending events before they run.

pub mod selector;

use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::audio::{
    AudioDevice, BluetoothHeadsetTracker, DeviceKind, PermissionGate, RouteController,
    ScoState, WiredHeadsetTracker,
};
use crate::error::{Result, SwitchError};
use crate::logging::Logger;
use crate::notifications::{
    AudioDeviceChangeListener, BluetoothHeadsetEvent, BluetoothHeadsetListener,
    NotificationManager,
};
use crate::priority::PreferredOrder;
use crate::system::{
    AudioManagerInterface, BluetoothCallback, BluetoothEvent, BluetoothHeadsetInterface,
    FocusChangeListener, PermissionInterface, SimulatedAudioManager, SimulatedBluetooth,
    SimulatedPermissions, SimulatedPlatform, SimulatedWiredHeadset, WiredCallback, WiredEvent,
    WiredHeadsetInterface,
};

pub use selector::DeviceSelector;

/// Library version, `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_SCO_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings fixed for the lifetime of an [`AudioSwitch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchConfig {
    pub preferred_order: PreferredOrder,
    /// How long to wait for a Bluetooth SCO link before giving up on the headset
    pub sco_timeout: Duration,
    /// Cache, adjust and restore the platform audio mode around activation
    pub manage_audio_mode: bool,
    pub logging_enabled: bool,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            preferred_order: PreferredOrder::default(),
            sco_timeout: DEFAULT_SCO_TIMEOUT,
            manage_audio_mode: true,
            logging_enabled: false,
        }
    }
}

impl SwitchConfig {
    /// Default settings with a custom, possibly partial, preferred device order
    pub fn with_preferred_devices(preferred: &[DeviceKind]) -> Result<Self> {
        Ok(Self {
            preferred_order: PreferredOrder::new(preferred)?,
            ..Self::default()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    Stopped,
    Started,
    Activated,
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchState::Stopped => write!(f, "stopped"),
            SwitchState::Started => write!(f, "started"),
            SwitchState::Activated => write!(f, "activated"),
        }
    }
}

#[derive(Debug)]
enum EventKind {
    Bluetooth(BluetoothEvent),
    Wired(WiredEvent),
}

/// A platform callback tagged with the session it was registered in
#[derive(Debug)]
struct SessionEvent {
    generation: u64,
    kind: EventKind,
}

enum Wake {
    Event(Option<SessionEvent>),
    ScoDeadline,
}

/// Manages audio routing for one call session.
///
/// Generic over the platform collaborators so the same state machine runs against real
/// platform bindings, the simulated platform and test doubles.
pub struct AudioSwitch<B, W, M, P>
where
    B: BluetoothHeadsetInterface,
    W: WiredHeadsetInterface,
    M: AudioManagerInterface,
    P: PermissionInterface,
{
    logger: Logger,
    state: SwitchState,
    generation: u64,
    bluetooth: PermissionGate<B, P>,
    wired: WiredHeadsetTracker<W>,
    route: RouteController<M>,
    selector: DeviceSelector,
    notifications: NotificationManager,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
}

/// An [`AudioSwitch`] running on the in-process simulated platform
pub type SimulatedAudioSwitch = AudioSwitch<
    SimulatedBluetooth,
    SimulatedWiredHeadset,
    SimulatedAudioManager,
    SimulatedPermissions,
>;

impl SimulatedAudioSwitch {
    pub fn simulated(platform: &SimulatedPlatform, config: SwitchConfig) -> Self {
        Self::new(
            platform.bluetooth.clone(),
            platform.wired.clone(),
            platform.audio.clone(),
            platform.permissions.clone(),
            config,
        )
    }
}

impl<B, W, M, P> AudioSwitch<B, W, M, P>
where
    B: BluetoothHeadsetInterface,
    W: WiredHeadsetInterface,
    M: AudioManagerInterface,
    P: PermissionInterface,
{
    pub fn new(bluetooth: B, wired: W, audio: M, permissions: P, config: SwitchConfig) -> Self {
        let logger = Logger::new(config.logging_enabled);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        log_debug!(
            logger,
            order = %config.preferred_order,
            sco_timeout_ms = config.sco_timeout.as_millis() as u64,
            "Creating audio switch"
        );

        let tracker = BluetoothHeadsetTracker::new(bluetooth, config.sco_timeout, logger.clone());
        Self {
            state: SwitchState::Stopped,
            generation: 0,
            bluetooth: PermissionGate::new(tracker, permissions),
            wired: WiredHeadsetTracker::new(wired, logger.clone()),
            route: RouteController::new(audio, config.manage_audio_mode, logger.clone()),
            selector: DeviceSelector::new(config.preferred_order, logger.clone()),
            notifications: NotificationManager::new(logger.clone()),
            events_tx,
            events_rx,
            logger,
        }
    }

    pub fn version() -> &'static str {
        VERSION
    }

    pub fn state(&self) -> SwitchState {
        self.state
    }

    pub fn preferred_order(&self) -> &PreferredOrder {
        self.selector.order()
    }

    pub fn logging_enabled(&self) -> bool {
        self.logger.is_enabled()
    }

    pub fn set_logging_enabled(&mut self, enabled: bool) {
        self.logger.set_enabled(enabled);
    }

    /// Available devices in priority order
    pub fn available_audio_devices(&self) -> &[AudioDevice] {
        self.selector.available()
    }

    pub fn selected_audio_device(&self) -> Option<&AudioDevice> {
        self.selector.selected()
    }

    /// Replace the device change listener. `None` silences notifications without
    /// stopping the session.
    pub fn set_audio_device_change_listener(&mut self, listener: Option<AudioDeviceChangeListener>) {
        self.notifications.set_device_listener(listener);
    }

    pub fn set_bluetooth_listener(&mut self, listener: Option<BluetoothHeadsetListener>) {
        self.notifications.set_bluetooth_listener(listener);
    }

    /// Listener handed to the platform with the next audio focus request
    pub fn set_focus_change_listener(&mut self, listener: Option<FocusChangeListener>) {
        self.route.set_focus_listener(listener);
    }

    /// Start tracking devices and compute the initial selection.
    ///
    /// `listener`, when given, replaces the current device change listener and is
    /// notified once with the initial state. Calling `start` on a running switch does
    /// nothing.
    pub fn start(&mut self, listener: Option<AudioDeviceChangeListener>) {
        if self.state != SwitchState::Stopped {
            log_debug!(self.logger, state = %self.state, "Audio switch already started");
            return;
        }

        log_info!(self.logger, version = VERSION, "Starting audio switch");
        if listener.is_some() {
            self.notifications.set_device_listener(listener);
        }
        self.generation += 1;
        self.state = SwitchState::Started;
        self.start_bluetooth();
        self.start_wired();

        // Headsets reported during registration form the initial state, not changes
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
        }
        self.refresh(true, Instant::now());
    }

    /// Release every platform resource and forget all session state, including the
    /// device change listener. Callbacks still in flight are ignored.
    pub fn stop(&mut self) {
        if self.state == SwitchState::Stopped {
            return;
        }

        log_info!(self.logger, "Stopping audio switch");
        self.deactivate_route();
        self.bluetooth.stop();
        self.wired.stop();
        self.generation += 1;
        while self.events_rx.try_recv().is_ok() {}
        self.selector.clear();
        self.notifications.set_device_listener(None);
        self.state = SwitchState::Stopped;
    }

    /// Take audio focus and route audio to the selected device.
    ///
    /// Idempotent while activated. A declined focus request is logged; the switch still
    /// counts as activated and retries focus on the next call.
    pub fn activate(&mut self) -> Result<()> {
        self.process_pending_events();
        if self.state == SwitchState::Stopped {
            return Err(SwitchError::NotStarted);
        }

        self.state = SwitchState::Activated;
        if let Err(e) = self.route.activate() {
            log_warn!(self.logger, error = %e, "Activation side effects skipped");
            return Ok(());
        }

        let before = self.snapshot();
        self.apply_route(Instant::now());
        if self.snapshot() != before {
            self.notify();
        }
        Ok(())
    }

    /// Release focus and the routed device. Does nothing unless activated.
    pub fn deactivate(&mut self) {
        self.process_pending_events();
        if self.state != SwitchState::Activated {
            return;
        }
        self.deactivate_route();
        self.state = SwitchState::Started;
    }

    /// Pin `device` as the selection. Unknown devices are ignored.
    pub fn select_device(&mut self, device: &AudioDevice) {
        self.process_pending_events();
        if self.state == SwitchState::Stopped {
            log_warn!(self.logger, device = %device, "Ignoring selection on a stopped switch");
            return;
        }
        if !self.selector.available().contains(device) {
            let error = SwitchError::InvalidSelection(device.to_string());
            log_warn!(self.logger, error = %error, "Ignoring selection");
            return;
        }

        let before = self.snapshot();
        if let (Some(address), Some(tracker)) = (device.address(), self.bluetooth.tracker_mut()) {
            tracker.clear_activation_error(address);
        }
        self.selector.pin(device);
        self.refresh_since(before, false, Instant::now());
    }

    /// Drop any explicit selection and go back to priority-based selection.
    pub fn clear_selection(&mut self) {
        self.process_pending_events();
        if self.state == SwitchState::Stopped || !self.selector.is_pinned() {
            return;
        }
        self.selector.clear_pin();
        self.refresh(false, Instant::now());
    }

    /// Re-check the Bluetooth permission after the host comes back to the foreground.
    pub fn on_host_resumed(&mut self) {
        if self.state == SwitchState::Stopped || self.bluetooth.is_active() {
            return;
        }
        if self.bluetooth.is_permitted() {
            log_info!(self.logger, "Bluetooth permission granted, starting headset tracking");
            self.start_bluetooth();
            self.process_pending_events();
        }
    }

    /// Apply every queued platform callback, then check the SCO deadline.
    /// Returns the number of callbacks applied.
    pub fn process_pending_events(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event, Instant::now());
            processed += 1;
        }
        self.poll_timeouts(Instant::now());
        processed
    }

    /// Fail a Bluetooth SCO request that has been pending past its deadline at `now`.
    pub fn poll_timeouts(&mut self, now: Instant) {
        let Some(event) = self
            .bluetooth
            .tracker_mut()
            .and_then(|tracker| tracker.check_sco_timeout(now))
        else {
            return;
        };
        self.notifications.bluetooth_event(&event);
        self.on_activation_error(&event);
        self.refresh(false, now);
    }

    /// Wait for the next platform callback or SCO deadline and apply it.
    pub async fn next_event(&mut self) {
        let deadline = self
            .bluetooth
            .tracker()
            .and_then(|tracker| tracker.sco_deadline());

        let wake = match deadline {
            Some(deadline) => {
                tokio::select! {
                    event = self.events_rx.recv() => Wake::Event(event),
                    _ = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => {
                        Wake::ScoDeadline
                    }
                }
            }
            None => Wake::Event(self.events_rx.recv().await),
        };

        match wake {
            Wake::Event(Some(event)) => self.handle_event(event, Instant::now()),
            Wake::Event(None) => {}
            Wake::ScoDeadline => self.poll_timeouts(Instant::now()),
        }
    }

    fn start_bluetooth(&mut self) {
        let tx = self.events_tx.clone();
        let generation = self.generation;
        let callback: BluetoothCallback = Box::new(move |event| {
            let _ = tx.send(SessionEvent {
                generation,
                kind: EventKind::Bluetooth(event),
            });
        });
        if let Err(e) = self.bluetooth.start(callback) {
            log_warn!(self.logger, error = %e, "Bluetooth headsets unavailable");
        }
    }

    fn start_wired(&mut self) {
        let tx = self.events_tx.clone();
        let generation = self.generation;
        let callback: WiredCallback = Box::new(move |event| {
            let _ = tx.send(SessionEvent {
                generation,
                kind: EventKind::Wired(event),
            });
        });
        if let Err(e) = self.wired.start(callback) {
            log_warn!(self.logger, error = %e, "Wired headset detection unavailable");
        }
    }

    fn handle_event(&mut self, event: SessionEvent, now: Instant) {
        if self.apply_event(event) {
            self.refresh(false, now);
        }
    }

    /// Feed one callback to its tracker. Returns whether the selection needs recomputing.
    fn apply_event(&mut self, event: SessionEvent) -> bool {
        if event.generation != self.generation || self.state == SwitchState::Stopped {
            log_debug!(self.logger, event = ?event.kind, "Dropping event from a stopped session");
            return false;
        }

        match event.kind {
            EventKind::Bluetooth(event) => {
                let Some(headset_event) = self
                    .bluetooth
                    .tracker_mut()
                    .and_then(|tracker| tracker.handle_event(event))
                else {
                    return false;
                };
                self.notifications.bluetooth_event(&headset_event);
                self.on_activation_error(&headset_event);
                self.on_audio_disconnected(&headset_event);
                true
            }
            EventKind::Wired(event) => self.wired.handle_event(event),
        }
    }

    fn on_activation_error(&mut self, event: &BluetoothHeadsetEvent) {
        if let BluetoothHeadsetEvent::ActivationError(device) = event {
            log_warn!(self.logger, device = %device, "Falling back from Bluetooth headset");
            self.selector.unpin(device);
        }
    }

    /// A routed headset whose SCO link dropped is routed again on the next refresh.
    fn on_audio_disconnected(&mut self, event: &BluetoothHeadsetEvent) {
        let BluetoothHeadsetEvent::AudioDisconnected(device) = event else {
            return;
        };
        let link_idle = self
            .bluetooth
            .tracker()
            .is_some_and(|tracker| *tracker.sco_state() == ScoState::Idle);
        if link_idle && self.route.release_link(device) {
            log_info!(self.logger, device = %device, "Bluetooth audio dropped, reconnecting");
        }
    }

    fn snapshot(&self) -> (Vec<AudioDevice>, Option<AudioDevice>) {
        (
            self.selector.available().to_vec(),
            self.selector.selected().cloned(),
        )
    }

    /// Recompute the selection, apply it to the platform and notify on any change.
    fn refresh(&mut self, force_notify: bool, now: Instant) {
        let before = self.snapshot();
        self.refresh_since(before, force_notify, now);
    }

    /// Like [`refresh`](Self::refresh), comparing against a snapshot taken before the
    /// caller changed the selection itself.
    fn refresh_since(
        &mut self,
        before: (Vec<AudioDevice>, Option<AudioDevice>),
        force_notify: bool,
        now: Instant,
    ) {
        self.recompute(&[]);
        self.apply_route(now);
        if force_notify || self.snapshot() != before {
            self.notify();
        }
    }

    fn recompute(&mut self, rejected: &[AudioDevice]) -> bool {
        let mut candidates: Vec<AudioDevice> = self.bluetooth.headsets().to_vec();
        candidates.extend(self.wired.headset().cloned());
        if self.route.has_earpiece() {
            candidates.push(AudioDevice::Earpiece);
        }
        candidates.push(AudioDevice::Speakerphone);

        let failed: HashSet<String> = self
            .bluetooth
            .tracker()
            .map(|tracker| tracker.activation_errors().clone())
            .unwrap_or_default();

        self.selector.recompute(candidates, |device| {
            rejected.contains(device) || device.address().is_some_and(|a| failed.contains(a))
        })
    }

    /// Route audio to the selected device, falling back through the priority order when
    /// a Bluetooth headset cannot be activated.
    fn apply_route(&mut self, now: Instant) {
        let mut rejected: Vec<AudioDevice> = Vec::new();
        loop {
            let selected = self.selector.selected().cloned();
            let result = self
                .route
                .route_to(selected.as_ref(), self.bluetooth.tracker_mut(), now);

            let (Err(e), Some(device)) = (result, selected) else {
                return;
            };
            log_warn!(self.logger, device = %device, error = %e, "Could not route audio");
            if rejected.contains(&device) {
                return;
            }
            self.selector.unpin(&device);
            let event = BluetoothHeadsetEvent::ActivationError(device.clone());
            self.notifications.bluetooth_event(&event);
            rejected.push(device);
            self.recompute(&rejected);
        }
    }

    fn deactivate_route(&mut self) {
        self.route.deactivate(self.bluetooth.tracker_mut());
    }

    fn notify(&mut self) {
        self.notifications
            .devices_changed(self.selector.available(), self.selector.selected());
    }
}

impl<B, W, M, P> Drop for AudioSwitch<B, W, M, P>
where
    B: BluetoothHeadsetInterface,
    W: WiredHeadsetInterface,
    M: AudioManagerInterface,
    P: PermissionInterface,
{
    fn drop(&mut self) {
        self.stop();
    }
}
