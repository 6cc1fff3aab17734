use fmsynth::{
    analysis::{max_step, rms, PitchAnalyzer},
    dsp::Waveform,
    io::{midi_to_synth, AudioBuffer, MidiEvent, TimedEvent},
    synth::{
        ParamId, ParamSnapshot, SoundDescriptor, SynthMessage, Voice, VoiceEvent, VoicePool,
        VoiceState,
    },
    Engine, EngineConfig,
};
use rtrb::RingBuffer;

fn prepared_pool(voices: usize, sample_rate: f32, block: usize) -> VoicePool {
    let mut pool = VoicePool::with_voices(voices);
    pool.prepare(sample_rate, block, 2);
    pool.apply_params(&ParamSnapshot::default());
    pool
}

fn render_blocks(pool: &mut VoicePool, blocks: usize, block: usize) -> Vec<f32> {
    let mut out = AudioBuffer::new(2, block);
    let mut left = Vec::with_capacity(blocks * block);
    for _ in 0..blocks {
        out.clear();
        pool.render_block(&mut out, &[], 0, block);
        left.extend_from_slice(out.channel(0));
    }
    left
}

#[test]
fn renders_silence_without_notes() {
    let (mut engine, _handle) = Engine::new(EngineConfig::default()).expect("valid config");
    let mut output = AudioBuffer::new(2, 512);
    for _ in 0..4 {
        engine.process_block(&mut output, &[]);
        assert!(output.channels().all(|c| c.iter().all(|&s| s == 0.0)));
    }
}

#[test]
fn mixing_two_voices_equals_the_sum_of_each() {
    const BLOCK: usize = 256;
    let mut both = prepared_pool(2, 48_000.0, BLOCK);
    let mut low = prepared_pool(1, 48_000.0, BLOCK);
    let mut high = prepared_pool(1, 48_000.0, BLOCK);

    both.handle_note_on(60, 1.0, 1);
    both.handle_note_on(67, 1.0, 1);
    low.handle_note_on(60, 1.0, 1);
    high.handle_note_on(67, 1.0, 1);

    let mixed = render_blocks(&mut both, 20, BLOCK);
    let a = render_blocks(&mut low, 20, BLOCK);
    let b = render_blocks(&mut high, 20, BLOCK);

    for (i, ((m, a), b)) in mixed.iter().zip(&a).zip(&b).enumerate() {
        assert!((m - (a + b)).abs() < 1e-5, "sample {i}: {m} != {a} + {b}");
    }
}

#[test]
fn single_voice_lifecycle_at_44k1() {
    const SAMPLE_RATE: f32 = 44_100.0;
    const BLOCK: usize = 512;

    let (tx, mut rx) = RingBuffer::new(64);
    let mut pool = prepared_pool(1, SAMPLE_RATE, BLOCK);
    pool.set_telemetry(tx);
    let mut out = AudioBuffer::new(2, BLOCK);

    pool.handle_note_on(60, 1.0, 1);
    for block in 0..10 {
        out.clear();
        pool.render_block(&mut out, &[], 0, BLOCK);
        assert_eq!(pool.active_voice_count(), 1, "block {block}");
        assert!(rms(out.channel(0)) > 0.0, "block {block} is silent");
    }

    pool.handle_note_off(60, 0.0, 1, true);
    assert_eq!(pool.active_voice_count(), 1, "tail-off must keep the voice");

    let release_samples = ParamSnapshot::default().envelope.release * SAMPLE_RATE;
    let mut rendered = 0usize;
    while pool.active_voice_count() > 0 {
        out.clear();
        pool.render_block(&mut out, &[], 0, BLOCK);
        rendered += BLOCK;
        assert!(rendered < 10 * SAMPLE_RATE as usize, "voice never went idle");
    }

    let rendered = rendered as f32;
    assert!(
        rendered >= release_samples && rendered <= release_samples + BLOCK as f32,
        "idle after {rendered} samples, release is {release_samples}"
    );

    let events: Vec<_> = std::iter::from_fn(|| rx.pop().ok()).collect();
    assert_eq!(events.last(), Some(&VoiceEvent::VoiceIdle { voice: 0 }));
}

#[test]
fn retrigger_during_release_does_not_click() {
    const BLOCK: usize = 256;
    let mut voice = Voice::new();
    voice.prepare(48_000.0, BLOCK, 1);
    voice.update_envelope(0.1, 0.1, 0.8, 0.5);

    let mut out = AudioBuffer::new(1, BLOCK);
    let mut signal = Vec::new();
    let mut render = |voice: &mut Voice, blocks: usize, signal: &mut Vec<f32>| {
        for _ in 0..blocks {
            out.clear();
            voice.render_block(&mut out, 0, BLOCK);
            signal.extend_from_slice(out.channel(0));
        }
    };

    voice.start_note(60, 1.0, 1, &SoundDescriptor::Universal, 0);
    render(&mut voice, 60, &mut signal);
    voice.stop_note(0.0, true);
    render(&mut voice, 20, &mut signal);
    assert!(voice.is_active());
    voice.start_note(60, 1.0, 1, &SoundDescriptor::Universal, 0);
    render(&mut voice, 20, &mut signal);

    // A 261 Hz sine at gain 0.3 moves at most ~0.01 per sample
    let step = max_step(&signal);
    assert!(step < 0.02, "click of {step} at retrigger");
}

#[test]
fn host_events_are_sample_accurate() {
    let config = EngineConfig::default().with_max_block_size(512);
    let (mut engine, _handle) = Engine::new(config).expect("valid config");

    let events = [TimedEvent::new(
        300,
        SynthMessage::NoteOn {
            note: 64,
            velocity: 1.0,
            channel: 1,
        },
    )];
    let mut output = AudioBuffer::new(2, 512);
    engine.process_block(&mut output, &events);

    for channel in output.channels() {
        assert!(channel[..300].iter().all(|&s| s == 0.0));
        assert!(channel[301..].iter().any(|&s| s != 0.0));
    }
}

#[test]
fn note_off_inside_a_block_starts_release_there() {
    let config = EngineConfig::default().with_max_block_size(512);
    let (mut engine, mut handle) = Engine::new(config).expect("valid config");
    handle.note_on(69, 1.0, 1);

    let mut output = AudioBuffer::new(2, 512);
    engine.process_block(&mut output, &[]);

    let events = [TimedEvent::new(
        100,
        SynthMessage::NoteOff {
            note: 69,
            velocity: 0.0,
            channel: 1,
            allow_tail_off: false,
        },
    )];
    engine.process_block(&mut output, &events);

    assert!(output.channel(0)[..100].iter().any(|&s| s != 0.0));
    assert!(output.channel(0)[100..].iter().all(|&s| s == 0.0));
    assert_eq!(engine.active_voice_count(), 0);
}

#[test]
fn midi_bytes_drive_the_engine() {
    let (mut engine, _handle) = Engine::new(EngineConfig::default()).expect("valid config");

    let note_on = MidiEvent::from_bytes(&[0x90, 57, 127])
        .and_then(|event| midi_to_synth(event, None))
        .expect("note-on decodes");
    let mut output = AudioBuffer::new(2, 512);
    engine.process_block(&mut output, &[TimedEvent::new(0, note_on)]);
    assert_eq!(engine.active_voice_count(), 1);

    // Note-on with velocity 0 is a note-off
    let note_off = MidiEvent::from_bytes(&[0x90, 57, 0])
        .and_then(|event| midi_to_synth(event, None))
        .expect("note-off decodes");
    engine.process_block(&mut output, &[TimedEvent::new(0, note_off)]);
    let voice = engine.pool().voice(0).expect("one voice");
    assert_eq!(voice.state(), VoiceState::Releasing);
}

#[test]
fn held_a4_measures_440_hz() {
    const SAMPLE_RATE: f32 = 48_000.0;
    let (mut engine, mut handle) = Engine::new(EngineConfig::default()).expect("valid config");
    handle.note_on(69, 1.0, 1);

    let mut output = AudioBuffer::new(2, 512);
    let mut signal = Vec::new();
    for _ in 0..80 {
        engine.process_block(&mut output, &[]);
        signal.extend_from_slice(output.channel(0));
    }

    // Skip attack and decay
    let steady = &signal[(0.25 * SAMPLE_RATE) as usize..];
    let mut analyzer = PitchAnalyzer::new(8192, SAMPLE_RATE);
    let measured = analyzer.dominant_frequency(steady).expect("tone present");
    assert!((measured - 440.0).abs() < 2.2, "measured {measured} Hz");
}

#[test]
fn published_parameters_change_the_sound() {
    let render = |depth: Option<f32>| {
        let (mut engine, mut handle) = Engine::new(EngineConfig::default()).expect("valid config");
        if let Some(depth) = depth {
            handle.params().set(ParamId::FmFreq, 110.0);
            handle.params().set(ParamId::FmDepth, depth);
            assert!(handle.params().publish());
        }
        handle.note_on(60, 1.0, 1);
        let mut output = AudioBuffer::new(2, 512);
        let mut signal = Vec::new();
        for _ in 0..8 {
            engine.process_block(&mut output, &[]);
            signal.extend_from_slice(output.channel(0));
        }
        signal
    };

    let plain = render(None);
    let modulated = render(Some(600.0));
    assert!(plain.iter().zip(&modulated).any(|(a, b)| (a - b).abs() > 1e-3));
}

#[test]
fn waveform_parameter_reaches_every_voice() {
    let config = EngineConfig::default().with_voices(4);
    let (mut engine, mut handle) = Engine::new(config).expect("valid config");
    assert!(handle.params().set_and_publish(ParamId::WaveType, 2.0));

    let mut output = AudioBuffer::new(2, 64);
    engine.process_block(&mut output, &[]);

    assert!(engine
        .pool()
        .voices()
        .all(|v| v.oscillator().waveform() == Waveform::Square));
}

#[test]
fn exhausted_pool_reports_through_the_handle() {
    let config = EngineConfig::default().with_voices(2);
    let (mut engine, mut handle) = Engine::new(config).expect("valid config");
    for note in [60, 64, 67] {
        handle.note_on(note, 1.0, 1);
    }

    let mut output = AudioBuffer::new(2, 512);
    engine.process_block(&mut output, &[]);

    let events = handle.poll_telemetry();
    assert_eq!(engine.active_voice_count(), 2);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, VoiceEvent::NoteDropped { note: 67, channel: 1 }))
            .count(),
        1
    );
}
