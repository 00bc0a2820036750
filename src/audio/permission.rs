use crate::error::{Result, SwitchError};
use crate::system::{
    BluetoothCallback, BluetoothHeadsetInterface, Permission, PermissionInterface,
};

use super::bluetooth::BluetoothHeadsetTracker;
use super::device::AudioDevice;

/// Runs Bluetooth tracking only while the Bluetooth connect permission is granted.
///
/// The permission is checked on every `start`; a denied gate behaves like a device
/// with no Bluetooth headsets.
pub struct PermissionGate<B: BluetoothHeadsetInterface, P: PermissionInterface> {
    tracker: BluetoothHeadsetTracker<B>,
    permissions: P,
}

impl<B: BluetoothHeadsetInterface, P: PermissionInterface> PermissionGate<B, P> {
    pub fn new(tracker: BluetoothHeadsetTracker<B>, permissions: P) -> Self {
        Self {
            tracker,
            permissions,
        }
    }

    pub fn is_permitted(&self) -> bool {
        self.permissions.is_granted(Permission::BluetoothConnect)
    }

    pub fn start(&mut self, callback: BluetoothCallback) -> Result<()> {
        if !self.is_permitted() {
            return Err(SwitchError::PermissionDenied);
        }
        self.tracker.start(callback)
    }

    pub fn stop(&mut self) {
        self.tracker.stop();
    }

    pub fn is_active(&self) -> bool {
        self.tracker.is_listening()
    }

    /// Connected headsets, or nothing while the gate is closed
    pub fn headsets(&self) -> &[AudioDevice] {
        if self.is_active() {
            self.tracker.headsets()
        } else {
            &[]
        }
    }

    /// The underlying tracker, only while tracking is running
    pub fn tracker(&self) -> Option<&BluetoothHeadsetTracker<B>> {
        self.is_active().then_some(&self.tracker)
    }

    pub fn tracker_mut(&mut self) -> Option<&mut BluetoothHeadsetTracker<B>> {
        if self.is_active() {
            Some(&mut self.tracker)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Logger;
    use crate::system::{PlatformCommand, PlatformLog, SimulatedBluetooth, SimulatedPermissions};
    use std::time::Duration;

    fn gate(
        permissions: SimulatedPermissions,
    ) -> (PermissionGate<SimulatedBluetooth, SimulatedPermissions>, SimulatedBluetooth, PlatformLog)
    {
        let log = PlatformLog::new();
        let bluetooth = SimulatedBluetooth::new(log.clone());
        let tracker = BluetoothHeadsetTracker::new(
            bluetooth.clone(),
            Duration::from_secs(5),
            Logger::default(),
        );
        (PermissionGate::new(tracker, permissions), bluetooth, log)
    }

    #[test]
    fn test_denied_permission_is_a_noop() {
        let (mut gate, bluetooth, log) = gate(SimulatedPermissions::denied());
        bluetooth.connect("MyHeadset", "AA:BB");

        assert_eq!(gate.start(Box::new(|_| {})), Err(SwitchError::PermissionDenied));
        assert!(gate.headsets().is_empty());
        assert!(gate.tracker_mut().is_none());

        gate.stop();
        assert!(log.commands().is_empty());
    }

    #[test]
    fn test_permission_is_rechecked_on_start() {
        let permissions = SimulatedPermissions::denied();
        let (mut gate, _, log) = gate(permissions.clone());
        assert!(gate.start(Box::new(|_| {})).is_err());

        permissions.grant(Permission::BluetoothConnect);
        gate.start(Box::new(|_| {})).unwrap();

        assert!(gate.is_active());
        assert_eq!(log.count(&PlatformCommand::StartBluetoothListening), 1);
    }
}
