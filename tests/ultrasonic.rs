mod common;

use common::*;
use unit_drivers::ultrasonic::{Config, Ultrasonic, MAX_DISTANCE_MM};
use unit_drivers::{Error, ErrorKind};

const UNIT: u8 = 0x57;

fn open(bus: &SimBus, delay: &SimDelay) -> Ultrasonic<SimBus, SimDelay> {
    bus.add_device(UNIT);
    let unit = Ultrasonic::new(bus.clone(), delay.clone(), Config::default()).unwrap();
    bus.clear_log();
    unit
}

#[test]
fn presence_is_an_acknowledged_read() {
    let bus = SimBus::new();
    assert_eq!(
        Ultrasonic::new(bus.clone(), SimDelay::new(), Config::default())
            .err()
            .map(|e| e.kind()),
        Some(ErrorKind::DeviceNotDetected)
    );

    bus.add_device(UNIT);
    assert!(Ultrasonic::new(bus.clone(), SimDelay::new(), Config::default()).is_ok());
    assert_eq!(
        bus.transfers().last().map(|t| (t.write.len(), t.read_len)),
        Some((0, 1))
    );
}

#[test]
fn measurement_triggers_waits_and_reads() {
    let bus = SimBus::new();
    let delay = SimDelay::new();
    let mut unit = open(&bus, &delay);

    // 250000 um
    bus.set_registers(UNIT, 0x01, &[0x03, 0xD0, 0x90]);
    assert_eq!(unit.distance_mm().unwrap(), 250.0);

    let transfers: Vec<_> = bus
        .transfers()
        .into_iter()
        .map(|t| (t.write, t.read_len))
        .collect();
    assert_eq!(transfers, vec![(vec![0x01], 0), (vec![], 3)]);
    assert_eq!(delay.ms_calls(), vec![20]);
}

#[test]
fn distance_is_capped() {
    let bus = SimBus::new();
    let delay = SimDelay::new();
    let mut unit = open(&bus, &delay);

    bus.set_registers(UNIT, 0x01, &[0xFF, 0xFF, 0xFF]);
    assert_eq!(unit.distance_mm().unwrap(), MAX_DISTANCE_MM);
    assert_eq!(unit.raw_measurement().unwrap(), [0xFF, 0xFF, 0xFF]);
}

#[test]
fn failed_trigger_skips_the_wait() {
    let bus = SimBus::new();
    let delay = SimDelay::new();
    let mut unit = open(&bus, &delay);

    bus.fail_after(0, SimError::NoAcknowledge);
    let err = unit.distance_mm().unwrap_err();
    bus.heal();

    assert_eq!(
        err,
        Error::Bus {
            address: addr(UNIT),
            register: Some(0x01),
            source: SimError::NoAcknowledge,
        }
    );
    assert!(delay.ms_calls().is_empty());
}
