use log::{debug, info, warn};

use crate::error::{MkvError, Result};
use crate::model::{Asset, COMP_HEADER_STRIP, Track};

/// Sample rate used when the file's value is unusable.
const FALLBACK_SAMPLE_RATE: f64 = 8000.0;

/// Largest codec private that header stripping will be applied to.
const MAX_HEADER_STRIP_INPUT: usize = 10_000_000;

/// Fill in derived track fields and summarise the tracks into `asset`.
///
/// Only video and audio tracks with a codec ID are considered. When several
/// video tracks are present the last one's dimensions win; audio channels are
/// summed and the last audio track's output rate wins.
pub fn aggregate(tracks: &mut [Track], asset: &mut Asset) -> Result<()> {
    asset.video_data = false;
    asset.layers = 0;
    asset.audio_data = false;
    asset.channels = 0;

    for track in tracks.iter_mut() {
        if !track.is_video() && !track.is_audio() {
            continue;
        }
        if track.codec_id.is_none() {
            continue;
        }

        let rate = track.audio.sample_rate;
        if rate < 0.0 || rate > f64::from(i32::MAX) || rate.is_nan() {
            track.audio.sample_rate = FALLBACK_SAMPLE_RATE;
        }

        if track.is_video() {
            derive_video_fields(track);
        } else if track.audio.out_sample_rate == 0.0 {
            track.audio.out_sample_rate = track.audio.sample_rate;
        }

        apply_content_encoding(track)?;

        debug!(
            "track {}: codec {}",
            track.number,
            track.codec_id.as_deref().unwrap_or_default()
        );

        if track.time_scale < 0.01 {
            track.time_scale = 1.0;
        }

        if track.is_video() {
            asset.video_data = true;
            asset.layers += 1;
            asset.width = track.video.pixel_width;
            asset.height = track.video.pixel_height;
        } else {
            asset.audio_data = true;
            asset.channels += track.audio.channels;
            asset.sample_rate = track.audio.out_sample_rate;
        }
    }

    Ok(())
}

fn derive_video_fields(track: &mut Track) {
    let video = &mut track.video;

    if track.default_duration == 0 && video.frame_rate > 0.0 {
        let duration = 1_000_000_000.0 / video.frame_rate;
        // `as` saturates; reject instead
        if duration >= 0.0 && duration < u64::MAX as f64 {
            track.default_duration = duration as u64;
        }
    }

    if video.display_width == u64::MAX {
        video.display_width = video.pixel_width;
    }
    if video.display_height == u64::MAX {
        video.display_height = video.pixel_height;
    }

    if let Ok(fourcc) = <[u8; 4]>::try_from(video.colour_space.data()) {
        info!(
            "track {}: colour space {:08X}",
            track.number,
            u32::from_le_bytes(fourcc)
        );
    }
}

/// Apply the single supported content encoding (header stripping) to the
/// codec private data. Anything else is logged and left as is.
fn apply_content_encoding(track: &mut Track) -> Result<()> {
    if track.encodings.len() > 1 {
        warn!(
            "track {}: {} content encodings, not applied",
            track.number,
            track.encodings.len()
        );
        return Ok(());
    }
    let Some(encoding) = track.encodings.first_mut() else {
        return Ok(());
    };

    debug!(
        "track {}: encoding type {} key id {} bytes, compression {}, codec private {} bytes",
        track.number,
        encoding.encoding_type,
        encoding.encryption.key_id.len(),
        encoding.compression.algo,
        track.codec_private.len()
    );

    if encoding.encoding_type != 0 {
        if encoding.encryption.key_id.is_empty() {
            encoding.scope = 0;
        } else {
            warn!(
                "track {}: encrypted (key id {} bytes), frames left as is",
                track.number,
                encoding.encryption.key_id.len()
            );
        }
        return Ok(());
    }

    if encoding.compression.algo != COMP_HEADER_STRIP {
        warn!(
            "track {}: unsupported compression algorithm {}",
            track.number, encoding.compression.algo
        );
        encoding.scope = 0;
        return Ok(());
    }

    if track.codec_private.is_empty() || encoding.scope & 2 == 0 {
        return Ok(());
    }

    if track.codec_private.len() >= MAX_HEADER_STRIP_INPUT {
        return Err(MkvError::TracksInvalid {
            track: track.number,
            reason: format!(
                "codec private of {} bytes too large for header stripping",
                track.codec_private.len()
            ),
        });
    }

    let header = encoding.compression.settings.data();
    if header.is_empty() {
        return Ok(());
    }
    let mut data = Vec::with_capacity(header.len() + track.codec_private.len());
    data.extend_from_slice(header);
    data.extend_from_slice(track.codec_private.data());
    track.codec_private.set_data(data);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ebml::Binary;
    use crate::model::{ContentEncoding, TRACK_TYPE_AUDIO, TRACK_TYPE_SUBTITLE, TRACK_TYPE_VIDEO};

    fn video(number: u64, width: u64, height: u64) -> Track {
        let mut t = Track {
            number,
            track_type: TRACK_TYPE_VIDEO,
            codec_id: Some("V_TEST".into()),
            ..Default::default()
        };
        t.video.pixel_width = width;
        t.video.pixel_height = height;
        t.video.display_width = u64::MAX;
        t.video.display_height = u64::MAX;
        t
    }

    fn audio(number: u64, rate: f64, channels: u64) -> Track {
        let mut t = Track {
            number,
            track_type: TRACK_TYPE_AUDIO,
            codec_id: Some("A_TEST".into()),
            ..Default::default()
        };
        t.audio.sample_rate = rate;
        t.audio.channels = channels;
        t
    }

    fn header_strip(settings: &[u8], scope: u64) -> ContentEncoding {
        let mut e = ContentEncoding {
            scope,
            ..Default::default()
        };
        e.compression.algo = COMP_HEADER_STRIP;
        e.compression.settings = Binary::new(settings.to_vec(), 0);
        e
    }

    #[test]
    fn test_single_video_track() {
        let mut tracks = vec![video(1, 640, 480)];
        tracks[0].video.frame_rate = 25.0;
        let mut asset = Asset::default();
        aggregate(&mut tracks, &mut asset).unwrap();

        assert!(asset.video_data);
        assert_eq!(asset.layers, 1);
        assert_eq!((asset.width, asset.height), (640, 480));
        assert!(!asset.audio_data);
        assert_eq!(tracks[0].default_duration, 40_000_000);
        assert_eq!(tracks[0].video.display_width, 640);
        assert_eq!(tracks[0].video.display_height, 480);
        // Zero track timescale is reset
        assert_eq!(tracks[0].time_scale, 1.0);
    }

    #[test]
    fn test_explicit_default_duration_kept() {
        let mut tracks = vec![video(1, 8, 8)];
        tracks[0].video.frame_rate = 25.0;
        tracks[0].default_duration = 33_366_667;
        aggregate(&mut tracks, &mut Asset::default()).unwrap();
        assert_eq!(tracks[0].default_duration, 33_366_667);
    }

    #[test]
    fn test_audio_channels_sum_and_last_rate_wins() {
        let mut tracks = vec![audio(1, 48000.0, 2), audio(2, 44100.0, 6)];
        let mut asset = Asset::default();
        aggregate(&mut tracks, &mut asset).unwrap();

        assert!(asset.audio_data);
        assert_eq!(asset.channels, 8);
        assert_eq!(asset.sample_rate, 44100.0);
        assert_eq!(tracks[0].audio.out_sample_rate, 48000.0);
    }

    #[test]
    fn test_invalid_sample_rate_clamped() {
        for bad in [-1.0, f64::NAN, 3e9] {
            let mut tracks = vec![audio(1, bad, 1)];
            let mut asset = Asset::default();
            aggregate(&mut tracks, &mut asset).unwrap();
            assert_eq!(tracks[0].audio.sample_rate, 8000.0);
            assert_eq!(asset.sample_rate, 8000.0);
        }
    }

    #[test]
    fn test_explicit_output_rate_kept() {
        let mut tracks = vec![audio(1, 24000.0, 2)];
        tracks[0].audio.out_sample_rate = 48000.0;
        let mut asset = Asset::default();
        aggregate(&mut tracks, &mut asset).unwrap();
        assert_eq!(asset.sample_rate, 48000.0);
    }

    #[test]
    fn test_ignored_tracks() {
        let mut no_codec = video(1, 100, 100);
        no_codec.codec_id = None;
        let subtitle = Track {
            track_type: TRACK_TYPE_SUBTITLE,
            codec_id: Some("S_TEXT/UTF8".into()),
            ..Default::default()
        };
        let mut tracks = vec![no_codec, subtitle];
        let mut asset = Asset {
            layers: 3,
            channels: 4,
            ..Default::default()
        };
        aggregate(&mut tracks, &mut asset).unwrap();
        assert_eq!(asset.layers, 0);
        assert_eq!(asset.channels, 0);
        assert!(!asset.video_data);
    }

    #[test]
    fn test_header_strip_prepends_settings() {
        let mut tracks = vec![video(1, 8, 8)];
        tracks[0].codec_private = Binary::new(vec![3, 4], 100);
        tracks[0].encodings.push(header_strip(&[1, 2], 3));
        aggregate(&mut tracks, &mut Asset::default()).unwrap();
        assert_eq!(tracks[0].codec_private.data(), &[1, 2, 3, 4]);
        assert_eq!(tracks[0].codec_private.len(), 4);
    }

    #[test]
    fn test_header_strip_frames_only_scope() {
        let mut tracks = vec![video(1, 8, 8)];
        tracks[0].codec_private = Binary::new(vec![3, 4], 0);
        tracks[0].encodings.push(header_strip(&[1, 2], 1));
        aggregate(&mut tracks, &mut Asset::default()).unwrap();
        assert_eq!(tracks[0].codec_private.data(), &[3, 4]);
    }

    #[test]
    fn test_other_compression_clears_scope() {
        let mut tracks = vec![video(1, 8, 8)];
        tracks[0].codec_private = Binary::new(vec![3, 4], 0);
        let mut zlib = header_strip(&[], 3);
        zlib.compression.algo = 0;
        tracks[0].encodings.push(zlib);
        aggregate(&mut tracks, &mut Asset::default()).unwrap();
        assert_eq!(tracks[0].encodings[0].scope, 0);
        assert_eq!(tracks[0].codec_private.data(), &[3, 4]);
    }

    #[test]
    fn test_encryption_without_key_clears_scope() {
        let mut tracks = vec![audio(1, 48000.0, 2)];
        tracks[0].encodings.push(ContentEncoding {
            scope: 1,
            encoding_type: 1,
            ..Default::default()
        });
        aggregate(&mut tracks, &mut Asset::default()).unwrap();
        assert_eq!(tracks[0].encodings[0].scope, 0);
    }

    #[test]
    fn test_multiple_encodings_untouched() {
        let mut tracks = vec![video(1, 8, 8)];
        tracks[0].codec_private = Binary::new(vec![3], 0);
        tracks[0].encodings.push(header_strip(&[1], 3));
        tracks[0].encodings.push(header_strip(&[2], 3));
        aggregate(&mut tracks, &mut Asset::default()).unwrap();
        assert_eq!(tracks[0].codec_private.data(), &[3]);
    }

    #[test]
    fn test_oversized_header_strip_is_fatal() {
        let mut tracks = vec![video(7, 8, 8)];
        tracks[0].codec_private = Binary::new(vec![0; MAX_HEADER_STRIP_INPUT], 0);
        tracks[0].encodings.push(header_strip(&[1], 2));
        let err = aggregate(&mut tracks, &mut Asset::default()).unwrap_err();
        assert!(matches!(err, MkvError::TracksInvalid { track: 7, .. }));
        assert!(err.is_fatal());
    }
}
