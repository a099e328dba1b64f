//! End-to-end runs against the simulated hand.

use std::sync::Arc;
use std::time::{Duration, Instant};

use grasp_core::event_loop::HandEvent;
use grasp_core::{
    ControllerCfg, EventLoop, GraspController, GraspOutcome, GraspRequest, HandCoordinator, Inbox,
    LoopOutput, Phase,
};
use grasp_hardware::{SimParams, SimulatedHand};
use grasp_traits::Clock;
use grasp_traits::clock::test_clock::TestClock;
use grasp_traits::msg::HandMode;

const TICK: Duration = Duration::from_millis(10);

fn params() -> SimParams {
    SimParams {
        contact_angle: [0.3, 0.4, 0.5],
        position_noise: 0.0,
        mode_latency_reports: 1,
        seed: 3,
    }
}

fn outcomes(out: &crossbeam_channel::Receiver<LoopOutput>) -> Vec<GraspOutcome> {
    out.try_iter()
        .filter_map(|o| match o {
            LoopOutput::Outcome(r) => Some(r.outcome),
            LoopOutput::Feedback { .. } => None,
        })
        .collect()
}

struct SyncRig {
    hand: SimulatedHand,
    clock: TestClock,
    ev: EventLoop<SimulatedHand>,
    out: crossbeam_channel::Receiver<LoopOutput>,
}

impl SyncRig {
    fn new() -> Self {
        let hand = SimulatedHand::new(params());
        let clock = TestClock::new();
        let mut hc = HandCoordinator::new();
        hc.add(GraspController::with_clock(
            "bhand",
            ControllerCfg::default(),
            hand.clone(),
            Arc::new(clock.clone()),
        ))
        .unwrap();
        let (ev, out) =
            EventLoop::with_clock(hc, Inbox::new(), Duration::from_millis(100), Arc::new(clock.clone()));
        Self {
            hand,
            clock,
            ev,
            out,
        }
    }

    /// One 10 ms tick: joint sample every tick, status every other tick.
    fn tick(&mut self, n: u32) {
        self.clock.advance(TICK);
        self.hand.step(TICK);
        self.ev
            .handle(HandEvent::Joint(self.hand.joint_sample(self.clock.now())));
        if n % 2 == 0 {
            self.ev.handle(HandEvent::Status(self.hand.status()));
        }
    }
}

#[test]
fn grasp_closes_on_object_and_holds() {
    let mut rig = SyncRig::new();
    rig.ev.handle(HandEvent::Accept {
        controller: "bhand".into(),
        request: GraspRequest::uniform([true; 3], 2.0, 0.8).unwrap(),
    });

    let mut result = Vec::new();
    let mut feedback = 0;
    for n in 0..300 {
        rig.tick(n);
        for o in rig.out.try_iter() {
            match o {
                LoopOutput::Outcome(r) => result.push(r.outcome),
                LoopOutput::Feedback { .. } => feedback += 1,
            }
        }
        if !result.is_empty() {
            break;
        }
    }

    assert_eq!(result, vec![GraspOutcome::Succeeded]);
    for (i, angle) in [0.3, 0.4, 0.5].into_iter().enumerate() {
        assert!((rig.hand.inner_angle(i) - angle).abs() < 1e-9, "finger {i}");
        assert_eq!(rig.hand.commanded_mode(i), HandMode::HoldEffort);
    }
    assert_eq!(rig.ev.coordinator().get("bhand").unwrap().phase(), Some(Phase::Holding));
    // roughly one snapshot per 100 ms of a half-second run
    assert!((2..=10).contains(&feedback), "feedback count {feedback}");
}

#[test]
fn unused_finger_never_moves() {
    let mut rig = SyncRig::new();
    rig.ev.handle(HandEvent::Accept {
        controller: "bhand".into(),
        request: GraspRequest::uniform([true, false, true], 2.0, 0.8).unwrap(),
    });
    for n in 0..300 {
        rig.tick(n);
    }
    assert_eq!(outcomes(&rig.out), vec![GraspOutcome::Succeeded]);
    assert_eq!(rig.hand.inner_angle(1), 0.0);
    assert_eq!(rig.hand.commanded_mode(1), HandMode::Idle);
}

#[test]
fn cancel_mid_approach_idles_the_hand() {
    let mut rig = SyncRig::new();
    rig.ev.handle(HandEvent::Accept {
        controller: "bhand".into(),
        request: GraspRequest::uniform([true; 3], 0.5, 0.8).unwrap(),
    });
    for n in 0..10 {
        rig.tick(n);
    }
    rig.ev.handle(HandEvent::Cancel {
        controller: "bhand".into(),
    });
    for n in 10..30 {
        rig.tick(n);
    }
    assert_eq!(outcomes(&rig.out), vec![GraspOutcome::Preempted]);
    let stopped_at = rig.hand.inner_angle(0);
    assert!(stopped_at > 0.0 && stopped_at < 0.3);
    for i in 0..3 {
        assert_eq!(rig.hand.commanded_mode(i), HandMode::Idle);
    }
}

#[test]
fn threaded_loop_reaches_success_in_real_time() {
    let hand = SimulatedHand::new(params());
    let mut hc = HandCoordinator::new();
    hc.add(GraspController::new("bhand", ControllerCfg::default(), hand.clone()))
        .unwrap();
    let inbox = Inbox::new();
    let sensor = inbox.sensor_feed();
    let status = inbox.status_feed();
    let control = inbox.control();
    let (ev, out) = EventLoop::new(hc, inbox, Duration::from_millis(100));
    let worker = ev.spawn();

    control
        .accept("bhand", GraspRequest::uniform([true; 3], 3.0, 0.8).unwrap())
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut done = None;
    let mut n = 0u32;
    while done.is_none() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
        hand.step(Duration::from_millis(5));
        sensor.send(hand.joint_sample(Instant::now())).unwrap();
        if n % 2 == 0 {
            status.send(hand.status()).unwrap();
        }
        n += 1;
        done = out.try_iter().find_map(|o| match o {
            LoopOutput::Outcome(r) => Some(r.outcome),
            LoopOutput::Feedback { .. } => None,
        });
    }
    control.shutdown().unwrap();
    let hc = worker.join().unwrap();
    assert_eq!(done, Some(GraspOutcome::Succeeded));
    assert_eq!(hc.get("bhand").unwrap().phase(), Some(Phase::Holding));
}
