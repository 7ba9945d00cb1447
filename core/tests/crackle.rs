use hearth_core::{
    audio_output::{AudioOutput, OfflineOutput, PopVoice, UnsupportedOutput},
    config::CrackleConfig,
    crackle::{build_buffers, CrackleState, CrackleSynth},
    rng::{RngBank, RngSlot},
};

fn synth(seed: u64) -> CrackleSynth {
    CrackleSynth::new(
        CrackleConfig::default(),
        Box::new(OfflineOutput::new(48_000)),
        RngBank::new(seed).for_slot(RngSlot::Crackle),
    )
}

fn offline(synth: &CrackleSynth) -> &OfflineOutput {
    synth
        .output()
        .as_any()
        .downcast_ref::<OfflineOutput>()
        .expect("offline output")
}

fn offline_mut(synth: &mut CrackleSynth) -> &mut OfflineOutput {
    synth
        .output_mut()
        .as_any_mut()
        .downcast_mut::<OfflineOutput>()
        .expect("offline output")
}

fn run(synth: &mut CrackleSynth, real_ms: f64, step_ms: f64) {
    let mut left = real_ms;
    while left > 0.0 {
        synth.tick(step_ms);
        left -= step_ms;
    }
}

#[test]
fn start_and_stop_are_idempotent() {
    let mut s = synth(1);
    assert_eq!(s.state(), CrackleState::Uninitialized);
    assert!(!offline(&s).is_installed());

    assert!(s.start());
    assert_eq!(s.state(), CrackleState::Playing);
    assert!(offline(&s).is_installed());
    assert!(offline(&s).is_running());

    assert!(s.start());
    assert_eq!(s.state(), CrackleState::Playing);

    s.stop();
    assert_eq!(s.state(), CrackleState::Suspended);
    assert!(!offline(&s).is_running());
    assert_eq!(offline(&s).gain_target(), 0.0);

    s.stop();
    assert_eq!(s.state(), CrackleState::Suspended);

    assert!(s.start());
    assert_eq!(s.state(), CrackleState::Playing);
}

#[test]
fn stop_before_start_does_nothing() {
    let mut s = synth(1);
    s.stop();
    assert_eq!(s.state(), CrackleState::Uninitialized);
}

#[test]
fn missing_audio_disables_for_good() {
    let mut s = CrackleSynth::new(
        CrackleConfig::default(),
        Box::new(UnsupportedOutput),
        RngBank::new(1).for_slot(RngSlot::Crackle),
    );
    assert!(!s.start());
    assert!(s.is_disabled());
    assert!(!s.start());
    s.stop();
    s.set_intensity(0.7);
    s.tick(1_000.0);
    assert_eq!(s.state(), CrackleState::Disabled);
}

#[test]
fn intensity_is_clamped() {
    let mut s = synth(1);
    s.set_intensity(1.7);
    assert_eq!(s.intensity(), 1.0);
    s.set_intensity(-3.0);
    assert_eq!(s.intensity(), 0.0);
    s.set_intensity(0.4);
    assert_eq!(s.intensity(), 0.4);
    s.set_intensity(f64::NAN);
    assert_eq!(s.intensity(), 0.0);
}

#[test]
fn out_of_range_intensity_sounds_like_full_intensity() {
    let mut hot = synth(9);
    let mut full = synth(9);
    hot.set_intensity(1.7);
    full.set_intensity(1.0);
    hot.start();
    full.start();

    run(&mut hot, 5_000.0, 16.0);
    run(&mut full, 5_000.0, 16.0);

    assert_eq!(offline(&hot).pops_played(), offline(&full).pops_played());
    assert_eq!(offline(&hot).gain_target(), offline(&full).gain_target());
    let a = offline_mut(&mut hot).render(4_800);
    let b = offline_mut(&mut full).render(4_800);
    assert_eq!(a, b);
}

#[test]
fn bed_gain_tracks_intensity() {
    let mut cold = synth(2);
    cold.set_intensity(0.0);
    cold.start();
    assert!((offline(&cold).gain_target() - 0.008).abs() < 1e-6);

    let mut hot = synth(2);
    hot.set_intensity(1.0);
    hot.start();
    for _ in 0..200 {
        hot.tick(120.0);
        let target = offline(&hot).gain_target();
        assert!(
            (0.058 - 1e-6..=0.228 + 1e-6).contains(&target),
            "bed gain {target} out of range at full intensity"
        );
    }
}

#[test]
fn hotter_fire_pops_more_often() {
    let mut hot = synth(4);
    hot.set_intensity(1.0);
    hot.start();
    run(&mut hot, 60_000.0, 10.0);

    let mut cold = synth(4);
    cold.set_intensity(0.0);
    cold.start();
    run(&mut cold, 60_000.0, 10.0);

    let hot_pops = offline(&hot).pops_played();
    let cold_pops = offline(&cold).pops_played();
    assert!((120..=280).contains(&hot_pops), "hot pops: {hot_pops}");
    assert!(hot_pops > cold_pops * 2, "hot {hot_pops} vs cold {cold_pops}");
}

#[test]
fn a_stalled_host_gets_one_pop_not_a_burst() {
    let mut s = synth(6);
    s.set_intensity(1.0);
    s.start();
    s.tick(60_000.0);
    assert_eq!(offline(&s).pops_played(), 1);
}

#[test]
fn suspended_synth_is_silent() {
    let mut s = synth(8);
    s.set_intensity(1.0);
    s.start();
    run(&mut s, 2_000.0, 16.0);
    let played = offline(&s).pops_played();
    assert!(played > 0);

    s.stop();
    run(&mut s, 5_000.0, 16.0);
    assert_eq!(offline(&s).pops_played(), played);
    assert_eq!(offline(&s).active_voices(), 0);
    let out = offline_mut(&mut s).render(4_800);
    assert!(out.iter().all(|x| *x == 0.0));
}

#[test]
fn playing_synth_renders_bounded_sound() {
    let mut s = synth(3);
    s.set_intensity(1.0);
    s.start();
    run(&mut s, 500.0, 16.0);

    let out = offline_mut(&mut s).render(9_600);
    assert!(out.iter().any(|x| x.abs() > 0.0), "no sound while playing");
    assert!(out.iter().all(|x| x.abs() <= 0.9), "soft limiter let a sample through");
}

#[test]
fn unrendered_pops_do_not_pile_up() {
    let mut s = synth(11);
    s.set_intensity(1.0);
    s.start();

    let mut most_voices = 0;
    for _ in 0..3_750 {
        s.tick(16.0);
        most_voices = most_voices.max(offline(&s).active_voices());
    }

    assert!(offline(&s).pops_played() > 100, "pops: {}", offline(&s).pops_played());
    assert!(most_voices <= 2, "{most_voices} voices alive at once");
    assert!(offline(&s).now().abs_diff(60 * 48_000) <= 1);
    assert_eq!(offline(&s).cursor(), 0);
}

#[test]
fn pop_waits_for_its_scheduled_sample() {
    let config = CrackleConfig::default();
    let mut rng = RngBank::new(5).for_slot(RngSlot::Crackle);
    let buffers = build_buffers(&config, 48_000, &mut rng);
    let voice = PopVoice {
        peak:        0.5,
        attack_secs: config.pop_attack_secs,
        decay_secs:  config.pop_decay_secs,
        stop_secs:   config.pop_stop_secs,
    };

    let mut quiet = OfflineOutput::new(48_000);
    let mut popped = OfflineOutput::new(48_000);
    for out in [&mut quiet, &mut popped] {
        out.install(buffers.clone()).unwrap();
        out.resume().unwrap();
        out.ramp_gain(1.0, 0.0);
        out.advance_clock(250.0);
    }
    popped.play_pop(voice);
    assert_eq!(popped.now(), 12_000);
    assert_eq!(popped.active_voices(), 1);

    // A quarter second behind the clock: bed only.
    assert_eq!(quiet.render(12_000), popped.render(12_000));
    assert_eq!(popped.active_voices(), 1, "pop dropped before it sounded");

    let with_pop = popped.render(4_800);
    assert_ne!(quiet.render(4_800), with_pop);
    assert_eq!(popped.active_voices(), 0);
}

#[test]
fn later_pops_sound_later() {
    let mut s = synth(12);
    s.set_intensity(1.0);
    s.start();

    // Render in step with the ticks; every pop starts inside the
    // 16 ms slice that follows the tick that fired it.
    let mut last_played = 0;
    let mut starts = Vec::new();
    for _ in 0..300 {
        s.tick(16.0);
        let out = offline(&s);
        if out.pops_played() > last_played {
            last_played = out.pops_played();
            starts.push(out.now());
        }
        let pending = (out.now() - out.cursor()) as usize;
        offline_mut(&mut s).render(pending);
        assert!(offline(&s).active_voices() <= 2);
    }

    assert!(starts.len() > 5, "pops: {}", starts.len());
    // Gaps are never shorter than the hottest pop interval (220 ms).
    assert!(starts.windows(2).all(|w| w[1] - w[0] >= 10_000), "{starts:?}");
}

#[test]
fn buffers_have_the_configured_shape() {
    let config = CrackleConfig::default();
    let mut rng = RngBank::new(5).for_slot(RngSlot::Crackle);
    let buffers = build_buffers(&config, 48_000, &mut rng);

    assert_eq!(buffers.sample_rate, 48_000);
    assert_eq!(buffers.bed.len(), 57_600);
    assert_eq!(buffers.pop.len(), 3_840);
    assert!(buffers.bed.iter().all(|x| x.abs() <= 0.3));
    assert_eq!(buffers.pop[0], 0.0, "pop must start from silence");
    assert!(buffers.pop.iter().any(|x| *x != 0.0));
}

#[test]
fn pop_envelope_rises_then_falls() {
    let voice = PopVoice {
        peak: 0.5,
        attack_secs: 0.005,
        decay_secs: 0.08,
        stop_secs: 0.09,
    };
    assert_eq!(voice.gain_at(0.0), 0.0);
    assert!((voice.gain_at(0.0025) - 0.25).abs() < 1e-6);
    assert!((voice.gain_at(0.005) - 0.5).abs() < 1e-6);
    assert!(voice.gain_at(0.04) < voice.gain_at(0.01));
    assert!((voice.gain_at(0.08) - 0.0001).abs() < 1e-6);
    assert_eq!(voice.gain_at(0.09), 0.0);
    assert_eq!(voice.gain_at(-1.0), 0.0);
}
