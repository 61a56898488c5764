//! Chunked streaming decode of a WAV file, simulating online input.

fn main() {
    if let Err(e) = run() {
        eprintln!("vad-decode failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    use std::path::{Path, PathBuf};

    use voxseg::{VadConfig, VadModel};

    #[derive(Debug)]
    struct Args {
        model_path: PathBuf,
        wav_path: PathBuf,
        threshold: f32,
        chunk_size_ms: usize,
        num_threads: usize,
        device_id: i32,
    }

    fn parse_args() -> Result<Args, String> {
        let mut model_path: Option<PathBuf> = None;
        let mut wav_path: Option<PathBuf> = None;
        let mut threshold = 0.4f32;
        let mut chunk_size_ms = 100usize;
        let mut num_threads = 1usize;
        let mut device_id = -1i32;

        let mut it = std::env::args().skip(1);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--model-path" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --model-path".into());
                    };
                    model_path = Some(PathBuf::from(v));
                }
                "--wav-path" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --wav-path".into());
                    };
                    wav_path = Some(PathBuf::from(v));
                }
                "--threshold" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --threshold".into());
                    };
                    threshold = v
                        .parse::<f32>()
                        .map_err(|_| "invalid value for --threshold".to_string())?;
                }
                "--chunk-size-ms" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --chunk-size-ms".into());
                    };
                    chunk_size_ms = v
                        .parse::<usize>()
                        .map_err(|_| "invalid value for --chunk-size-ms".to_string())?
                        .clamp(1, 10_000);
                }
                "--num-threads" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --num-threads".into());
                    };
                    num_threads = v
                        .parse::<usize>()
                        .map_err(|_| "invalid value for --num-threads".to_string())?;
                }
                "--device-id" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --device-id".into());
                    };
                    device_id = v
                        .parse::<i32>()
                        .map_err(|_| "invalid value for --device-id".to_string())?;
                }
                "--help" | "-h" => {
                    println!(
                        "Usage: vad-decode --model-path <model.onnx> --wav-path <audio.wav> \\
  [--threshold <p>] [--chunk-size-ms <ms>] [--num-threads <n>] [--device-id <id>]"
                    );
                    std::process::exit(0);
                }
                other => return Err(format!("unknown argument: {other}")),
            }
        }

        let Some(model_path) = model_path else {
            return Err("--model-path is required".into());
        };
        let Some(wav_path) = wav_path else {
            return Err("--wav-path is required".into());
        };
        Ok(Args {
            model_path,
            wav_path,
            threshold,
            chunk_size_ms,
            num_threads,
            device_id,
        })
    }

    /// Read 16-bit integer PCM, averaging interleaved channels down to mono.
    fn read_wav_16bit_mono(path: &Path) -> Result<(Vec<f32>, u32), String> {
        let mut reader = hound::WavReader::open(path).map_err(|e| e.to_string())?;
        let spec = reader.spec();
        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(format!(
                "{}: expected 16-bit integer PCM, got {:?} at {} bits",
                path.display(),
                spec.sample_format,
                spec.bits_per_sample
            ));
        }

        let channels = usize::from(spec.channels.max(1));
        let mut mono = Vec::with_capacity(reader.len() as usize / channels);
        let mut frame_sum = 0.0f32;
        let mut frame_fill = 0usize;
        for sample in reader.samples::<i16>() {
            frame_sum += sample.map_err(|e| e.to_string())? as f32 / 32_768.0;
            frame_fill += 1;
            if frame_fill == channels {
                mono.push(frame_sum / channels as f32);
                frame_sum = 0.0;
                frame_fill = 0;
            }
        }
        Ok((mono, spec.sample_rate))
    }

    let args = parse_args()?;

    let (samples, sample_rate) = read_wav_16bit_mono(&args.wav_path)?;
    println!(
        "Loaded {} ({} samples at {} Hz)",
        args.wav_path.display(),
        samples.len(),
        sample_rate
    );

    let handle = VadModel::create(&args.model_path, args.num_threads, args.device_id)
        .map_err(|e| e.to_string())?;
    println!("Detected backend: {}", handle.vad_type());

    let config = VadConfig {
        threshold: args.threshold,
        sample_rate,
        ..VadConfig::default()
    };
    let mut stream = handle.init(config).map_err(|e| e.to_string())?;

    let chunk_size = (sample_rate as usize * args.chunk_size_ms) / 1000;
    let mut fed = 0;
    while fed < samples.len() {
        let n = chunk_size.min(samples.len() - fed);
        let is_last = fed + n == samples.len();
        let segments = stream
            .decode(&samples[fed..fed + n], is_last)
            .map_err(|e| e.to_string())?;
        for seg in segments {
            println!(
                "[segment {}] {} .. {} samples | {} .. {} ms",
                seg.idx, seg.start, seg.end, seg.start_ms, seg.end_ms
            );
        }
        fed += n;
    }

    Ok(())
}
