use std::path::Path;

use clap::Parser;
use mkv::model::{Asset, track_type_name};
use mkv::reader::{MatroskaDemuxer, MatroskaFile, open_mkv};

#[derive(Parser)]
#[command(name = "mkv-info", about = "Parse and display Matroska/WebM file structure")]
struct Args {
    /// Input .mkv/.webm file
    #[arg(short = 'f', long = "file")]
    file: Option<String>,

    /// Input .mkv/.webm file (positional)
    #[arg(conflicts_with = "file", required_unless_present_any = ["file", "schema", "version"])]
    input: Option<String>,

    /// Only list blocks of this track
    #[arg(short = 't', long = "track")]
    track_filter: Option<u64>,

    /// List the blocks of the first N clusters
    #[arg(long, value_name = "N")]
    clusters: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Print JSON schema for the output format and exit
    #[arg(long)]
    schema: bool,

    /// Display version and quit
    #[arg(long)]
    version: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Reset SIGPIPE to default so piped output (e.g. head/tail) exits cleanly
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    if args.version {
        mkv::version::print_cli_version_banner(
            "MKV Info Tool",
            env!("CARGO_PKG_VERSION"),
            env!("RELEASE_VERSION"),
            env!("GIT_COMMIT"),
        );
        return Ok(());
    }

    if args.schema {
        let schema = schemars::schema_for!(MatroskaFile);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let Some(file) = args.file.as_ref().or(args.input.as_ref()) else {
        return Err("an input file is required".into());
    };
    let path = Path::new(file);
    if !mkv::probe::has_mkv_extension(path) {
        log::warn!("{file}: extension is not .mkv or .webm");
    }

    if args.json {
        let mut reader = open_mkv(path)?;
        let parsed = mkv::reader::parse_mkv(&mut reader)?;
        println!("{}", serde_json::to_string(&parsed)?);
        return Ok(());
    }

    let mut demuxer = MatroskaDemuxer::new(open_mkv(path)?);
    let mut asset = Asset::default();
    demuxer.read_header(&mut asset)?;

    print_summary(&demuxer, &asset);
    print_index(&mut demuxer)?;

    if let Some(limit) = args.clusters {
        print_clusters(&mut demuxer, limit, args.track_filter)?;
    }

    Ok(())
}

fn print_summary<R: std::io::Read + std::io::Seek>(demuxer: &MatroskaDemuxer<R>, asset: &Asset) {
    let header = demuxer.header();
    let info = &demuxer.segment().info;

    println!(
        "DocType: {} (read version {})",
        header.doctype.as_deref().unwrap_or("?"),
        header.doctype_version
    );
    println!("Segment payload at 0x{:X}", demuxer.segment_start());
    println!(
        "TimecodeScale: {} ns, Duration: {:.0} ticks",
        info.time_scale, info.duration
    );
    if let Some(title) = &info.title {
        println!("Title: {title}");
    }
    if let Some(app) = &info.muxing_app {
        println!("Muxing app: {app}");
    }
    println!();

    println!(
        "{:>3} {:>8} {:<18} {:>5} {:>12} {:>11} {:>9} {:>3}",
        "#", "Type", "Codec", "Lang", "Size", "Rate", "Duration", "Ch"
    );
    for track in demuxer.tracks() {
        let size = if track.is_video() {
            format!("{}x{}", track.video.pixel_width, track.video.pixel_height)
        } else {
            String::new()
        };
        let rate = if track.is_audio() {
            format!("{}", track.audio.out_sample_rate)
        } else {
            String::new()
        };
        println!(
            "{:>3} {:>8} {:<18} {:>5} {:>12} {:>11} {:>9} {:>3}",
            track.number,
            track_type_name(track.track_type),
            track.codec_id.as_deref().unwrap_or("-"),
            track.language.as_deref().unwrap_or(""),
            size,
            rate,
            track.default_duration,
            if track.is_audio() {
                track.audio.channels.to_string()
            } else {
                String::new()
            },
        );
    }
    println!();

    println!(
        "Asset: video={} layers={} {}x{} audio={} channels={} rate={}",
        asset.video_data,
        asset.layers,
        asset.width,
        asset.height,
        asset.audio_data,
        asset.channels,
        asset.sample_rate
    );

    let segment = demuxer.segment();
    println!(
        "Attachments: {}, Chapters: {}, Tags: {}, SeekHead entries: {}",
        segment.attachments.len(),
        segment.chapters.len(),
        segment.tags.len(),
        segment.seekhead.len()
    );
}

fn print_index<R: std::io::Read + std::io::Seek>(
    demuxer: &mut MatroskaDemuxer<R>,
) -> Result<(), Box<dyn std::error::Error>> {
    let time_scale = demuxer.segment().info.time_scale;
    let index = demuxer.index()?.to_vec();
    if demuxer.is_index_broken() {
        println!("Index: incomplete (SeekHead or Cues could not be read)");
    }
    if index.is_empty() {
        println!("Index: none");
        return Ok(());
    }

    println!("Index: {} entries", index.len());
    println!("{:>15} {:>5} {:>16}", "TIME(ms)", "TID", "OFFSET");
    for entry in &index {
        for position in &entry.positions {
            println!(
                "{:>15} {:>5} {:>16}",
                entry.time_ns(time_scale) / 1_000_000,
                position.track,
                position.byte_offset
            );
        }
    }
    Ok(())
}

fn print_clusters<R: std::io::Read + std::io::Seek>(
    demuxer: &mut MatroskaDemuxer<R>,
    limit: usize,
    track_filter: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!(
        "{:>5} {:>3} {:>9} {:>6} {:>16} {:>8} {:>15}",
        "TID", "KF", "LACING", "FRAMES", "OFFSET", "SIZE", "PTS"
    );

    for _ in 0..limit {
        let Some(cluster) = demuxer.next_cluster()? else {
            break;
        };
        println!("----------- CLUSTER {} -----------", cluster.timecode);

        for block in &cluster.blocks {
            let Some(header) = block.header() else {
                continue;
            };
            if track_filter.is_some_and(|t| t != header.track) {
                continue;
            }
            let pts = cluster.timecode as i64 + i64::from(header.timecode);
            let frames = block
                .frames()
                .map_or_else(|| "?".to_string(), |f| f.len().to_string());
            println!(
                "{:>5} {:>3} {:>9} {:>6} {:>16} {:>8} {:>15}",
                header.track,
                if block.is_keyframe() { 1 } else { 0 },
                format!("{:?}", header.lacing()),
                frames,
                block.data.position(),
                block.data.len(),
                pts,
            );
        }
    }
    Ok(())
}
