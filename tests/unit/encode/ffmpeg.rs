use super::*;

fn cfg(w: u32, h: u32) -> SinkConfig {
    SinkConfig {
        width: w,
        height: h,
        fps: Fps::new(20, 1).unwrap(),
    }
}

fn out_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("glyphrain_ffmpeg_{tag}_{}.mp4", std::process::id()))
}

fn solid(w: u32, h: u32, px: [u8; 4]) -> FrameRGBA {
    FrameRGBA {
        width: w,
        height: h,
        data: px.repeat((w * h) as usize),
        premultiplied: true,
    }
}

/// Frame whose pixel `(x, y)` is `[x, y, 0, 255]`.
fn gradient(w: u32, h: u32) -> FrameRGBA {
    let mut data = Vec::new();
    for y in 0..h {
        for x in 0..w {
            data.extend_from_slice(&[x as u8, y as u8, 0, 255]);
        }
    }
    FrameRGBA {
        width: w,
        height: h,
        data,
        premultiplied: true,
    }
}

fn px(buf: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
}

#[test]
fn rejects_odd_and_zero_dimensions() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(out_path("odd")));
    assert!(matches!(
        sink.begin(cfg(33, 32)),
        Err(RainError::Validation(_))
    ));
    assert!(matches!(
        sink.begin(cfg(0, 32)),
        Err(RainError::Validation(_))
    ));
}

#[test]
fn refuses_to_overwrite_when_disabled() {
    let path = out_path("exists");
    std::fs::write(&path, b"x").unwrap();
    let mut opts = FfmpegSinkOpts::new(&path);
    opts.overwrite = false;
    let err = FfmpegSink::new(opts).begin(cfg(32, 32)).unwrap_err();
    assert!(err.to_string().contains("already exists"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn calls_before_begin_fail() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(out_path("unstarted")));
    let frame = FrameRGBA::transparent(Viewport::new(2, 2));
    assert!(sink.push_frame(TickIndex(0), &frame).is_err());
    assert!(sink.resize(Viewport::new(4, 4)).is_err());
    assert!(sink.end().is_err());
}

#[test]
fn encoder_args_carry_size_rate_and_overwrite_mode() {
    let mut opts = FfmpegSinkOpts::new("out/rain.mp4");
    opts.overwrite = false;
    let args: Vec<String> = encoder_args(&opts, Viewport::new(96, 64), Fps::new(1000, 50).unwrap())
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(args[0], "-n");
    let after = |flag: &str| {
        let i = args.iter().position(|a| a == flag).unwrap();
        args[i + 1].clone()
    };
    assert_eq!(after("-video_size"), "96x64");
    assert_eq!(after("-framerate"), "1000/50");
    assert_eq!(args.last().unwrap(), "out/rain.mp4");
}

#[test]
fn same_size_frames_are_flattened_over_bg() {
    let mut canvas = VideoCanvas::new(Viewport::new(2, 2), Rgba8::rgb(10, 20, 30));
    let out = canvas
        .compose(TickIndex(0), &FrameRGBA::transparent(Viewport::new(2, 2)))
        .unwrap();
    assert!(out.chunks_exact(4).all(|p| p == [10, 20, 30, 255]));
}

#[test]
fn smaller_frames_are_centred_on_bg() {
    let mut canvas = VideoCanvas::new(Viewport::new(4, 2), Rgba8::rgb(10, 20, 30));
    canvas.set_source(Viewport::new(2, 2)).unwrap();
    let out = canvas.compose(TickIndex(0), &solid(2, 2, [0, 255, 0, 255])).unwrap();
    for y in 0..2 {
        assert_eq!(px(out, 4, 0, y), [10, 20, 30, 255]);
        assert_eq!(px(out, 4, 1, y), [0, 255, 0, 255]);
        assert_eq!(px(out, 4, 2, y), [0, 255, 0, 255]);
        assert_eq!(px(out, 4, 3, y), [10, 20, 30, 255]);
    }
}

#[test]
fn larger_frames_are_cropped_around_the_centre() {
    let mut canvas = VideoCanvas::new(Viewport::new(2, 2), Rgba8::black());
    canvas.set_source(Viewport::new(4, 4)).unwrap();
    let out = canvas.compose(TickIndex(0), &gradient(4, 4)).unwrap();
    assert_eq!(px(out, 2, 0, 0), [1, 1, 0, 255]);
    assert_eq!(px(out, 2, 1, 0), [2, 1, 0, 255]);
    assert_eq!(px(out, 2, 0, 1), [1, 2, 0, 255]);
    assert_eq!(px(out, 2, 1, 1), [2, 2, 0, 255]);
}

#[test]
fn rejected_frame_does_not_advance_tick_order() {
    let mut canvas = VideoCanvas::new(Viewport::new(2, 2), Rgba8::black());
    canvas.compose(TickIndex(0), &solid(2, 2, [0; 4])).unwrap();
    assert!(matches!(
        canvas.compose(TickIndex(1), &solid(4, 4, [0; 4])),
        Err(RainError::Validation(_))
    ));
    canvas.compose(TickIndex(1), &solid(2, 2, [0; 4])).unwrap();
    assert!(matches!(
        canvas.compose(TickIndex(1), &solid(2, 2, [0; 4])),
        Err(RainError::Encode(_))
    ));
    assert_eq!(canvas.frames, 2);
}

#[test]
fn empty_resize_is_rejected() {
    let mut canvas = VideoCanvas::new(Viewport::new(2, 2), Rgba8::black());
    assert!(canvas.set_source(Viewport::new(0, 8)).is_err());
    assert_eq!(canvas.source, Viewport::new(2, 2));
}

#[test]
fn encodes_across_a_resize_when_ffmpeg_available() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let path = out_path("encode");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&path));
    sink.begin(cfg(16, 16)).unwrap();
    let frame = FrameRGBA::transparent(Viewport::new(16, 16));
    for i in 0..3 {
        sink.push_frame(TickIndex(i), &frame).unwrap();
    }
    assert!(sink.push_frame(TickIndex(1), &frame).is_err());

    sink.resize(Viewport::new(8, 12)).unwrap();
    let small = solid(8, 12, [0, 255, 0, 255]);
    sink.push_frame(TickIndex(3), &small).unwrap();
    sink.push_frame(TickIndex(4), &small).unwrap();
    sink.end().unwrap();
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
    let _ = std::fs::remove_file(&path);
}
