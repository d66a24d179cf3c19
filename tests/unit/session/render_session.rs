use super::*;
use crate::encode::sink::InMemorySink;
use crate::foundation::error::RainError;
use crate::render::surface::FrameRGBA;
use crate::schedule::SteppedScheduler;

fn config(w: u32, h: u32) -> RainConfig {
    RainConfig {
        viewport: Viewport::new(w, h),
        seed: Some(7),
        ..RainConfig::default()
    }
}

fn session(cfg: &RainConfig) -> RainSession {
    RainSession::with_font(cfg, None).unwrap()
}

#[test]
fn rejects_invalid_config() {
    let cfg = RainConfig {
        font_size_px: 0,
        ..config(64, 64)
    };
    assert!(matches!(
        RainSession::with_font(&cfg, None),
        Err(RainError::Validation(_))
    ));
}

#[test]
fn explicit_seed_is_reported() {
    let s = session(&config(64, 64));
    assert_eq!(s.seed(), 7);
    assert_eq!(s.tick_index(), TickIndex(0));
    assert_eq!(s.positions().len(), 4);
    assert!(s.font().is_none());
}

#[test]
fn advance_counts_ticks_and_moves_columns() {
    // Tall enough that no column can pass the bottom.
    let mut s = session(&config(64, 4000));
    s.advance(5).unwrap();
    assert_eq!(s.tick_index(), TickIndex(5));
    assert_eq!(s.positions(), &[5, 5, 5, 5]);
    s.tick().unwrap();
    assert_eq!(s.positions(), &[6, 6, 6, 6]);
}

#[test]
fn trail_darkens_the_surface() {
    let mut s = session(&config(16, 16));
    let frame = s.advance(20).unwrap();
    let px = frame.pixel(8, 8).unwrap();
    assert_eq!(&px[..3], &[0, 0, 0]);
    assert!(px[3] > 120, "alpha should accumulate, got {}", px[3]);
}

#[test]
fn scheduled_resize_applies_before_its_tick() {
    let mut cfg = config(64, 4000);
    cfg.resizes = vec![ResizeEvent {
        at_tick: TickIndex(3),
        width: 32,
        height: 4000,
    }];
    let mut s = session(&cfg);

    s.advance(3).unwrap();
    assert_eq!(s.viewport(), Viewport::new(64, 4000));
    assert_eq!(s.positions(), &[3, 3, 3, 3]);

    s.tick().unwrap();
    assert_eq!(s.viewport(), Viewport::new(32, 4000));
    assert_eq!(s.positions(), &[1, 1]);
    assert_eq!(s.frame().width, 32);
}

#[test]
fn manual_resize_restarts_columns() {
    let mut s = session(&config(64, 64));
    s.advance(2).unwrap();
    s.resize(Viewport::new(96, 32)).unwrap();
    assert_eq!(s.positions(), &[0; 6]);
    assert!(s.frame().data.iter().all(|&b| b == 0));
    assert!(s.resize(Viewport::new(0, 32)).is_err());
}

#[test]
fn run_pushes_every_tick_and_forwards_resizes() {
    let mut cfg = config(32, 32);
    cfg.resizes = vec![ResizeEvent {
        at_tick: TickIndex(2),
        width: 48,
        height: 16,
    }];
    let mut s = session(&cfg);
    let mut sink = InMemorySink::new();

    let stats = s.run(&mut SteppedScheduler::new(4), &mut sink).unwrap();

    assert_eq!(stats, RunStats { ticks: 4, resizes: 1 });
    let idx: Vec<u64> = sink.frames().iter().map(|(t, _)| t.0).collect();
    assert_eq!(idx, vec![0, 1, 2, 3]);
    assert_eq!(sink.frames()[1].1.width, 32);
    assert_eq!(sink.frames()[2].1.width, 48);
    assert_eq!(sink.resizes(), &[(2, Viewport::new(48, 16))]);
    assert!(sink.is_ended());

    let cfg_seen = sink.config().unwrap();
    assert_eq!(cfg_seen.fps.num, 1000);
    assert_eq!(cfg_seen.fps.den, 50);
}

#[derive(Default)]
struct FixedSizeSink {
    pushed: u64,
    ended: bool,
}

impl FrameSink for FixedSizeSink {
    fn begin(&mut self, _cfg: SinkConfig) -> RainResult<()> {
        Ok(())
    }
    fn push_frame(&mut self, _idx: TickIndex, _frame: &FrameRGBA) -> RainResult<()> {
        self.pushed += 1;
        Ok(())
    }
    fn end(&mut self) -> RainResult<()> {
        self.ended = true;
        Ok(())
    }
}

#[test]
fn run_fails_when_sink_rejects_resize() {
    let mut cfg = config(32, 32);
    cfg.resizes = vec![ResizeEvent {
        at_tick: TickIndex(1),
        width: 16,
        height: 16,
    }];
    let mut s = session(&cfg);
    let mut sink = FixedSizeSink::default();
    let err = s.run(&mut SteppedScheduler::new(3), &mut sink).unwrap_err();
    assert!(matches!(err, RainError::Validation(_)));
    assert_eq!(sink.pushed, 1);
    assert!(sink.ended, "sink must be closed after a failed run");
}

#[test]
fn failed_scheduled_resize_stays_pending() {
    let mut s = session(&config(64, 64));
    s.timeline.push(ResizeEvent {
        at_tick: TickIndex(1),
        width: 0,
        height: 16,
    });
    s.tick().unwrap();

    assert!(s.tick().is_err());
    assert_eq!(s.next_resize, 0);
    assert_eq!(s.tick_index(), TickIndex(1));
    assert_eq!(s.viewport(), Viewport::new(64, 64));

    s.timeline[0].width = 32;
    s.tick().unwrap();
    assert_eq!(s.next_resize, 1);
    assert_eq!(s.viewport(), Viewport::new(32, 16));
    assert_eq!(s.positions(), &[1, 1]);
}

#[test]
fn entropy_seed_replays() {
    let cfg = RainConfig {
        seed: None,
        ..config(160, 48)
    };
    let mut a = session(&cfg);
    a.advance(80).unwrap();

    let replay = RainConfig {
        seed: Some(a.seed()),
        ..cfg
    };
    let mut b = session(&replay);
    b.advance(80).unwrap();
    assert_eq!(a.positions(), b.positions());
}
