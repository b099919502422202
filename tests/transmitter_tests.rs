//! Integration tests for the LED bitstream transmitter

mod common;
use common::*;

use moka_core::{ConfigError, PulseTiming, Rgb8, TABLE_LEN, TransmitError, TransmitState, Transmitter, WHITE};

fn lit_device() -> moka_core::Device<TestInstant> {
    let mut device = new_device();
    device.leds_mut().set_mask(0xFFFF);
    device
}

#[test]
fn new_transmitter_is_stopped_with_period_configured() {
    let tx = new_transmitter();
    assert_eq!(tx.state(), TransmitState::Idle);
    assert_eq!(tx.pulse().period, Some(20));
    assert!(tx.pulse().pin_low);
    assert!(!tx.pulse().running);
}

#[test]
fn arm_builds_full_table_of_two_widths() {
    let mut device = lit_device();
    for id in 0..16 {
        device
            .leds_mut()
            .set_color(id, Rgb8::new(id as u8 * 16, 0xA5, 0x3C))
            .unwrap();
    }
    let mut tx = new_transmitter();
    let timing = tx.timing();

    tx.arm(&device.leds().frame(true)).unwrap();

    assert_eq!(tx.table().len(), TABLE_LEN);
    assert_eq!(tx.table().len(), 384);
    assert!(
        tx.table()
            .as_slice()
            .iter()
            .all(|&w| w == timing.zero_high || w == timing.one_high)
    );
}

#[test]
fn white_ring_encodes_all_ones() {
    let mut device = lit_device();
    device.leds_mut().set_all(WHITE);
    let mut tx = new_transmitter();

    tx.arm(&device.leds().frame(true)).unwrap();

    let one = tx.timing().one_high;
    assert!(tx.table().as_slice().iter().all(|&w| w == one));
}

#[test]
fn green_is_sent_before_red() {
    let mut device = lit_device();
    device.leds_mut().set_color(0, Rgb8::new(0xFF, 0x00, 0x00)).unwrap();
    let mut tx = new_transmitter();
    let timing = tx.timing();

    tx.arm(&device.leds().frame(true)).unwrap();

    let table = tx.table().as_slice();
    assert!(table[0..8].iter().all(|&w| w == timing.zero_high));
    assert!(table[8..16].iter().all(|&w| w == timing.one_high));
    assert!(table[16..24].iter().all(|&w| w == timing.zero_high));
}

#[test]
fn display_off_sends_only_zero_bits() {
    let mut device = lit_device();
    device.leds_mut().set_all(WHITE);
    device.leds_mut().set_display_state(false);
    let mut tx = new_transmitter();

    tx.arm(&device.leds().frame(true)).unwrap();

    let zero = tx.timing().zero_high;
    assert!(tx.table().as_slice().iter().all(|&w| w == zero));
}

#[test]
fn masked_off_ring_sends_only_zero_bits() {
    let mut device = new_device();
    device.leds_mut().set_all(WHITE);
    device.leds_mut().set_mask(0);
    let mut tx = new_transmitter();

    tx.arm(&device.leds().frame(true)).unwrap();

    let zero = tx.timing().zero_high;
    assert!(tx.table().as_slice().iter().all(|&w| w == zero));
}

#[test]
fn interrupts_stream_the_table_then_stop() {
    let mut device = lit_device();
    device.leds_mut().set_color(7, Rgb8::new(1, 2, 3)).unwrap();
    let mut tx = new_transmitter();

    tx.arm(&device.leds().frame(true)).unwrap();
    assert!(tx.is_busy());
    assert!(tx.pulse().running);
    assert_eq!(tx.cursor(), 0);

    let interrupts = run_to_completion(&mut tx);

    assert_eq!(interrupts, TABLE_LEN);
    assert_eq!(tx.state(), TransmitState::Idle);
    assert!(!tx.pulse().running);
    assert!(tx.pulse().pin_low);
    assert_eq!(tx.pulse().widths.as_slice(), tx.table().as_slice());
}

#[test]
fn final_interrupt_reports_completion() {
    let device = lit_device();
    let mut tx = new_transmitter();
    tx.arm(&device.leds().frame(true)).unwrap();

    for _ in 0..TABLE_LEN - 1 {
        assert!(!tx.on_period_elapsed());
    }
    assert_eq!(tx.cursor(), TABLE_LEN - 1);
    assert!(tx.on_period_elapsed());
    assert!(!tx.on_period_elapsed());
}

#[test]
fn rearm_while_busy_is_refused_and_table_kept() {
    let mut device = lit_device();
    device.leds_mut().set_all(WHITE);
    let mut tx = new_transmitter();
    tx.arm(&device.leds().frame(true)).unwrap();
    for _ in 0..10 {
        tx.on_period_elapsed();
    }
    let before = tx.table().clone();

    device.leds_mut().clear();
    let result = tx.arm(&device.leds().frame(true));

    assert_eq!(result, Err(TransmitError::Busy { cursor: 10 }));
    assert_eq!(tx.table(), &before);
    assert_eq!(tx.cursor(), 10);
    assert_eq!(tx.pulse().starts, 1);
}

#[test]
fn edits_after_arm_do_not_reach_the_wire() {
    let mut device = lit_device();
    device.leds_mut().set_all(WHITE);
    let mut tx = new_transmitter();
    tx.arm(&device.leds().frame(true)).unwrap();

    device.leds_mut().clear();
    device.leds_mut().set_display_state(false);
    run_to_completion(&mut tx);

    let one = tx.timing().one_high;
    assert!(tx.pulse().widths.iter().all(|&w| w == one));
}

#[test]
fn transmitter_can_be_rearmed_after_completion() {
    let device = lit_device();
    let mut tx = new_transmitter();

    tx.arm(&device.leds().frame(true)).unwrap();
    run_to_completion(&mut tx);
    tx.arm(&device.leds().frame(true)).unwrap();

    assert!(tx.is_busy());
    assert_eq!(tx.cursor(), 0);
    assert_eq!(tx.pulse().starts, 2);
}

#[test]
fn equal_pulse_widths_are_refused() {
    let timing = PulseTiming {
        period: 20,
        zero_high: 10,
        one_high: 10,
    };

    let result = Transmitter::new(MockPulse::new(), timing);

    assert_eq!(result.err(), Some(ConfigError::InvalidPulseTiming));
}

#[test]
fn timing_derived_from_clock_drives_the_table() {
    let timing = PulseTiming::for_clock_hz(8_000_000).unwrap();
    let mut device = lit_device();
    device.leds_mut().set_color(0, Rgb8::new(0, 0x80, 0)).unwrap();
    let mut tx = new_transmitter_with(timing);

    tx.arm(&device.leds().frame(true)).unwrap();

    assert_eq!(tx.pulse().period, Some(10));
    assert_eq!(tx.table().get(0), Some(5));
    assert_eq!(tx.table().get(1), Some(2));
}
