//! Tests for PowerSequencer ordering.
//!
//! The interrupt gate may only open once the controller is powered and out
//! of reset, and must close before any supply goes down. Otherwise the pump
//! reads from a chip that is booting or losing power.

#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
)]

use std::time::{Duration, Instant};

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use mstar_touch::{Model, PowerHandles, PowerSequencer, PowerStep};
use platform::mocks::{Call, CallLog, MockDelay, MockIrq, MockPin, MockSupplies};
use platform::{InterruptLine, IrqLine, ResetLine, ResetPolarity, SwitchedSupplies};

fn mock_sequencer(
    model: Model,
    log: &CallLog,
    seed: u32,
) -> PowerSequencer<MockSupplies, MockPin, MockDelay> {
    PowerSequencer::with_seed(
        model.profile(),
        PowerHandles {
            supplies: MockSupplies::new(log),
            reset: ResetLine::new(MockPin::new("reset", log), ResetPolarity::ActiveLow),
            delay: MockDelay::new(log),
        },
        seed,
    )
}

/// Interrupt enable is the very last step, after reset is released.
#[tokio::test]
async fn interrupt_enabled_after_power_and_reset() {
    let log = CallLog::new();
    let irq = MockIrq::new(&log);
    let mut seq = mock_sequencer(Model::Msg2638, &log, 1);

    seq.start(&irq).await.unwrap();

    let supplies_on = log.position(Call::Supplies(true)).unwrap();
    let reset_asserted = log.position(Call::Pin("reset", false)).unwrap();
    let reset_released = log.position(Call::Pin("reset", true)).unwrap();
    let irq_on = log.position(Call::Irq(true)).unwrap();

    assert!(supplies_on < reset_asserted);
    assert!(reset_asserted < reset_released);
    assert!(reset_released < irq_on);
    assert_eq!(irq_on, log.calls().len() - 1);
}

/// Delays match the msg2638 profile: 15 ms chip-on, 50 ms firmware boot.
#[tokio::test]
async fn msg2638_delays_follow_profile() {
    let log = CallLog::new();
    let irq = MockIrq::new(&log);
    let mut seq = mock_sequencer(Model::Msg2638, &log, 7);

    seq.start(&irq).await.unwrap();

    let calls = log.calls();
    assert_eq!(calls[1], Call::DelayUs(15_000));
    assert_eq!(calls[5], Call::DelayUs(50_000));
}

/// Interrupt disable strictly precedes supplies off.
#[tokio::test]
async fn interrupt_disabled_before_supplies_off() {
    let log = CallLog::new();
    let irq = MockIrq::new(&log);
    let mut seq = mock_sequencer(Model::Msg2238, &log, 1);

    seq.start(&irq).await.unwrap();
    log.clear();
    seq.stop(&irq).await.unwrap();

    assert_eq!(log.calls(), [Call::Irq(false), Call::Supplies(false)]);
}

/// Stopping an already stopped sequencer is harmless.
#[tokio::test]
async fn stop_when_stopped_does_not_fail() {
    let log = CallLog::new();
    let irq = MockIrq::new(&log);
    let mut seq = mock_sequencer(Model::Msg2238, &log, 1);

    seq.stop(&irq).await.unwrap();
    seq.stop(&irq).await.unwrap();
    assert!(!irq.is_enabled());
}

/// Real board wiring: two GPIO load switches and an active-low reset.
#[tokio::test]
async fn switched_supplies_power_cycle() {
    let log = CallLog::new();
    let irq = MockIrq::new(&log);
    let vdd = MockPin::new("vdd", &log);
    let vddio = MockPin::new("vddio", &log);
    let mut seq = PowerSequencer::new(
        Model::Msg2238.profile(),
        PowerHandles {
            supplies: SwitchedSupplies::new([("vdd", vdd), ("vddio", vddio)]),
            reset: ResetLine::new(MockPin::new("reset", &log), ResetPolarity::ActiveLow),
            delay: MockDelay::new(&log),
        },
    );

    seq.start(&irq).await.unwrap();
    seq.stop(&irq).await.unwrap();

    let pins: Vec<Call> = log
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Pin(..) | Call::Irq(_)))
        .collect();
    assert_eq!(
        pins,
        [
            Call::Pin("vdd", true),
            Call::Pin("vddio", true),
            Call::Pin("reset", false),
            Call::Pin("reset", true),
            Call::Irq(true),
            Call::Irq(false),
            Call::Pin("vddio", false),
            Call::Pin("vdd", false),
        ]
    );
}

/// A rail that fails to come up aborts before reset is touched.
#[tokio::test]
async fn failing_rail_aborts_power_up() {
    let log = CallLog::new();
    let irq = MockIrq::new(&log);
    let vdd = MockPin::new("vdd", &log);
    let vddio = MockPin::new("vddio", &log);
    vddio.fail_next();
    let mut seq = PowerSequencer::new(
        Model::Msg2238.profile(),
        PowerHandles {
            supplies: SwitchedSupplies::new([("vdd", vdd), ("vddio", vddio)]),
            reset: ResetLine::new(MockPin::new("reset", &log), ResetPolarity::ActiveLow),
            delay: MockDelay::new(&log),
        },
    );

    let err = seq.start(&irq).await.unwrap_err();
    assert_eq!(err.step, PowerStep::EnableSupplies);
    assert_eq!(
        log.calls(),
        [Call::Pin("vdd", true), Call::Pin("vdd", false)]
    );
    assert!(!irq.is_enabled());
}

/// With real timers, power-up takes at least chip-on + pulse + boot time.
#[tokio::test]
async fn real_delay_power_up_takes_profile_time() {
    let log = CallLog::new();
    let irq: IrqLine<NoopRawMutex> = IrqLine::new();
    let mut seq = PowerSequencer::new(
        Model::Msg2238.profile(),
        PowerHandles {
            supplies: MockSupplies::new(&log),
            reset: ResetLine::new(MockPin::new("reset", &log), ResetPolarity::ActiveLow),
            delay: embassy_time::Delay,
        },
    );

    let started = Instant::now();
    seq.start(&irq).await.unwrap();
    let elapsed = started.elapsed();

    // 10 ms chip-on + at least 10 ms reset pulse + 20 ms firmware boot
    assert!(elapsed >= Duration::from_millis(40), "took {elapsed:?}");
    assert!(irq.is_enabled());
}

proptest::proptest! {
    /// msg2238 reset pulse stays within [10000, 11000] us for any seed.
    #[test]
    fn msg2238_pulse_always_in_range(seed in proptest::prelude::any::<u32>()) {
        let log = CallLog::new();
        let irq = MockIrq::new(&log);
        let mut seq = mock_sequencer(Model::Msg2238, &log, seed);

        for _ in 0..4 {
            log.clear();
            embassy_futures::block_on(seq.start(&irq)).unwrap();
            let Call::DelayUs(pulse) = log.calls()[3] else {
                panic!("expected reset pulse delay, got {:?}", log.calls()[3]);
            };
            proptest::prop_assert!((10_000..=11_000).contains(&pulse), "pulse {}", pulse);
        }
    }

    /// Profile-level pulse selection covers the whole closed range.
    #[test]
    fn pulse_selection_stays_in_range(entropy in proptest::prelude::any::<u32>()) {
        let profile = Model::Msg2638.profile();
        let pulse = profile.reset_pulse_us(entropy);
        proptest::prop_assert!(pulse >= profile.reset_pulse_min_us);
        proptest::prop_assert!(pulse <= profile.reset_pulse_max_us);
    }
}
