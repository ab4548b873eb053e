mod common;

use common::*;
use unit_drivers::servo_unit::{Config, ExtIoMode, ServoUnit};
use unit_drivers::{AdcResolution, Argument, Error};

const UNIT: u8 = 0x25;

fn open(bus: &SimBus) -> ServoUnit<SimBus> {
    m5_unit(bus, UNIT);
    let unit = ServoUnit::new(bus.clone(), Config::default()).unwrap();
    bus.clear_log();
    unit
}

#[test]
fn pin_modes() {
    let bus = SimBus::new();
    let mut unit = open(&bus);

    unit.set_all_pin_mode(ExtIoMode::ServoCtl).unwrap();
    unit.set_pin_mode(7, ExtIoMode::RgbLed).unwrap();

    assert_eq!(
        bus.writes(UNIT),
        vec![vec![0x00, 3, 3, 3, 3, 3, 3, 3, 3], vec![0x07, 4]]
    );
    assert_eq!(unit.pin_mode(0).unwrap(), Some(ExtIoMode::ServoCtl));
    assert_eq!(unit.pin_mode(7).unwrap(), Some(ExtIoMode::RgbLed));

    bus.set_register(UNIT, 0x03, 0x09);
    assert_eq!(unit.pin_mode(3).unwrap(), None);
}

#[test]
fn pins_outside_the_unit_are_rejected() {
    let bus = SimBus::new();
    let mut unit = open(&bus);

    assert_eq!(
        unit.set_pin_mode(8, ExtIoMode::Pwm),
        Err(Error::InvalidArgument(Argument::Channel))
    );
    assert_eq!(
        unit.digital_input(8),
        Err(Error::InvalidArgument(Argument::Channel))
    );
    assert_eq!(
        unit.set_servo_angle(9, 90),
        Err(Error::InvalidArgument(Argument::Channel))
    );
    assert_eq!(bus.transfer_count(), 0);
}

#[test]
fn digital_io() {
    let bus = SimBus::new();
    let mut unit = open(&bus);

    unit.set_digital_output(2, true).unwrap();
    unit.set_digital_output(3, false).unwrap();
    assert_eq!(bus.writes(UNIT), vec![vec![0x12, 1], vec![0x13, 0]]);

    bus.set_register(UNIT, 0x25, 1);
    assert!(unit.digital_input(5).unwrap());
    assert!(!unit.digital_input(6).unwrap());
}

#[test]
fn analog_inputs() {
    let bus = SimBus::new();
    let mut unit = open(&bus);

    bus.set_register(UNIT, 0x34, 0xAB);
    bus.set_registers(UNIT, 0x48, &[0x34, 0x0C]);

    assert_eq!(unit.analog_input(4, AdcResolution::Bits8).unwrap(), 0xAB);
    assert_eq!(unit.analog_input(4, AdcResolution::Bits12).unwrap(), 0x0C34);
}

#[test]
fn servo_outputs() {
    let bus = SimBus::new();
    let mut unit = open(&bus);

    unit.set_servo_angle(1, 180).unwrap();
    unit.set_servo_pulse(3, 1500).unwrap();
    assert_eq!(
        bus.writes(UNIT),
        vec![vec![0x51, 180], vec![0x66, 0xDC, 0x05]]
    );

    bus.clear_log();
    assert_eq!(
        unit.set_servo_angle(1, 181),
        Err(Error::InvalidArgument(Argument::Angle))
    );
    assert_eq!(
        unit.set_servo_pulse(3, 499),
        Err(Error::InvalidArgument(Argument::Pulse))
    );
    assert_eq!(
        unit.set_servo_pulse(3, 2501),
        Err(Error::InvalidArgument(Argument::Pulse))
    );
    assert_eq!(bus.transfer_count(), 0);
}

#[test]
fn led_and_pwm_outputs() {
    let bus = SimBus::new();
    let mut unit = open(&bus);

    unit.set_led_color(2, 0x11_22_33).unwrap();
    unit.set_pwm(6, 100).unwrap();
    assert_eq!(
        bus.writes(UNIT),
        vec![vec![0x76, 0x11, 0x22, 0x33], vec![0x96, 100]]
    );

    bus.clear_log();
    assert_eq!(
        unit.set_pwm(6, 101),
        Err(Error::InvalidArgument(Argument::DutyCycle))
    );
    assert_eq!(
        unit.set_led_color(2, 0x0100_0000),
        Err(Error::InvalidArgument(Argument::Width))
    );
    assert_eq!(bus.transfer_count(), 0);
}

#[test]
fn telemetry_and_addressing() {
    let bus = SimBus::new();
    let mut unit = open(&bus);

    bus.set_registers(UNIT, 0xA0, &0.5f32.to_le_bytes());
    assert_eq!(unit.servo_current().unwrap(), 0.5);
    assert_eq!(unit.firmware_version().unwrap(), 0x02);

    unit.set_address(addr(0x26)).unwrap();
    assert_eq!(unit.i2c_address().unwrap(), 0x26);
    assert!(bus.has_device(0x26));
}
