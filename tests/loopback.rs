//! End-to-end tests: the protocol worker talking to the simulated board.

use std::sync::mpsc::Receiver;
use std::thread::sleep;
use std::time::{Duration, Instant};

use slotline::board::{GhostCarMode, SimulatedBoard};
use slotline::wire::{RecordGhostCar, SetupIo, StartGhostCar};
use slotline::{
    Config, Connector, Engine, Event, GhostCarSample, Handle, InputFunction, TriggerEdge,
};

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Hands the same shared board to the worker on every (re)connect.
struct SimConnector(SimulatedBoard);

impl Connector for SimConnector {
    type Link = SimulatedBoard;

    fn open(&mut self) -> std::io::Result<Self::Link> {
        Ok(self.0.clone())
    }
}

fn lap_config() -> Config {
    Config {
        io: SetupIo {
            bits_input: (1 << 5) | (1 << 6),
            bits_output: 0,
            with_spi_extension: 0,
        },
        // Light barriers pull the line low when a car passes.
        functions: vec![
            InputFunction {
                bit: 5,
                edge: TriggerEdge::Falling,
            },
            InputFunction {
                bit: 6,
                edge: TriggerEdge::Falling,
            },
        ],
    }
}

fn start(config: Config) -> (SimulatedBoard, Handle, Receiver<Event>) {
    let board = SimulatedBoard::new();
    let (handle, events) = Engine::spawn(SimConnector(board.clone()), config);
    (board, handle, events)
}

fn wait_for<F>(events: &Receiver<Event>, mut accept: F) -> Event
where
    F: FnMut(&Event) -> bool,
{
    let deadline = Instant::now() + EVENT_TIMEOUT;

    while Instant::now() < deadline {
        if let Ok(event) = events.recv_timeout(EVENT_TIMEOUT) {
            if accept(&event) {
                return event;
            }
        }
    }

    panic!("expected event did not arrive within {EVENT_TIMEOUT:?}");
}

fn wait_for_board<F>(board: &SimulatedBoard, mut condition: F)
where
    F: FnMut(&SimulatedBoard) -> bool,
{
    let deadline = Instant::now() + EVENT_TIMEOUT;

    while Instant::now() < deadline {
        if condition(board) {
            return;
        }

        sleep(Duration::from_millis(10));
    }

    panic!("board did not reach the expected state within {EVENT_TIMEOUT:?}");
}

#[test]
fn connects_and_synchronizes_time() {
    let (_board, handle, events) = start(lap_config());

    assert_eq!(
        wait_for(&events, |event| matches!(event, Event::Connected(_))),
        Event::Connected(true)
    );

    let sync = wait_for(&events, |event| matches!(event, Event::TimeSync(_)));

    if let Event::TimeSync(time_sync) = sync {
        assert!(time_sync.is_synchronized());
    }

    handle.stop();
}

#[test]
fn reports_a_lap_on_the_falling_edge() {
    let (board, handle, events) = start(lap_config());
    wait_for(&events, |event| event == &Event::Connected(true));

    // Let the board's start-up batch pass through.
    board.advance(500);
    sleep(Duration::from_millis(50));
    while events.try_recv().is_ok() {}

    // A car crosses the light barrier on lane one (pin 5).
    board.with_pins(|pins| pins.set_digital(5, false));
    board.advance(1);

    let event = wait_for(&events, |event| {
        matches!(event, Event::Digital(digital) if digital.changed != 0)
    });

    if let Event::Digital(digital) = event {
        // Function 0 fired; the line itself reads low now.
        assert_eq!(digital.changed, 0b01);
        assert_eq!(digital.value & (1 << 5), 0);
    }

    handle.stop();
}

#[test]
fn records_a_throttle_profile() {
    let (board, handle, events) = start(lap_config());
    wait_for(&events, |event| event == &Event::Connected(true));

    board.with_pins(|pins| pins.set_analog(3, 1023));
    handle
        .start_recording(RecordGhostCar {
            cycle: 50,
            volt_bit: 3,
            ampere_bit: -1,
        })
        .unwrap();

    wait_for_board(&board, |board| {
        board.with_sampler(|sampler| sampler.state().ghost_car.mode == GhostCarMode::Record)
    });

    // Four sampling periods of full throttle.
    board.advance(200);

    // 1023 * 255 / 1024
    wait_for(&events, |event| {
        matches!(event, Event::Analog(analog) if analog.volt == 254)
    });

    handle.stop_recording().unwrap();
    let recorded = wait_for(&events, |event| {
        matches!(event, Event::GhostCarRecorded(_))
    });

    if let Event::GhostCarRecorded(samples) = recorded {
        assert!(!samples.is_empty());
        assert!(samples.iter().all(|sample| sample.volt == 254));
    }

    handle.stop();
}

#[test]
fn replays_a_profile_onto_the_lane() {
    let (board, handle, events) = start(lap_config());
    wait_for(&events, |event| event == &Event::Connected(true));

    let profile = vec![
        GhostCarSample {
            volt: 200,
            ampere: 20,
        };
        3
    ];
    handle
        .start_replay(
            profile,
            StartGhostCar {
                cycle: 20,
                bit: 14,
                ampere_bit: 2,
                control_cycle: -1,
                dec_factor: 1,
                inc_factor: 4,
            },
        )
        .unwrap();

    // The worker feeds one sample per period into the board's ring.
    wait_for_board(&board, |board| {
        board.with_sampler(|sampler| {
            sampler.state().ghost_car.mode == GhostCarMode::Replay
                && !sampler.state().ghost_car.ring.is_empty()
        })
    });

    // The next board tick applies the sample to the lane's PWM pin.
    board.advance(1);
    assert_eq!(board.with_pins(|pins| pins.last_pwm(14)), Some(200));

    handle.stop();
}
