mod common;

use std::io::{Cursor, Write};

use common::*;
use mkv::ids;
use mkv::{Asset, MatroskaDemuxer, MkvError, ParseState};

/// Segment payload of Info, Tracks and Cues followed by the given clusters,
/// with cue positions pointing at each cluster.
fn indexed_payload(tracks: Vec<u8>, clusters: &[(u64, Vec<u8>)]) -> Vec<Vec<u8>> {
    let info = info(1_000_000);
    let cues_for = |offsets: &[u64]| {
        let points: Vec<Vec<u8>> = clusters
            .iter()
            .zip(offsets)
            .map(|((time, _), &pos)| cue_point(*time, 1, pos))
            .collect();
        master(ids::CUES, &points)
    };

    let placeholder = cues_for(&vec![1; clusters.len()]);
    let mut at = (info.len() + tracks.len() + placeholder.len()) as u64;
    let mut offsets = Vec::new();
    for (_, c) in clusters {
        offsets.push(at);
        at += c.len() as u64;
    }
    assert!(offsets.iter().all(|&o| o < 256));
    let cues = cues_for(&offsets);
    assert_eq!(cues.len(), placeholder.len());

    let mut payload = vec![info, tracks, cues];
    payload.extend(clusters.iter().map(|(_, c)| c.clone()));
    payload
}

fn cluster(timecode: u64, frames: usize) -> Vec<u8> {
    let mut children = vec![uint(ids::CLUSTER_TIMECODE, timecode)];
    for i in 0..frames {
        children.push(simple_block(1, i as i16 * 40, i == 0, &[0xEE; 4]));
    }
    master(ids::CLUSTER, &children)
}

#[test]
fn test_minimal_document_asset() {
    let data = document(
        "matroska",
        &[
            info(1_000_000),
            master(ids::TRACKS, &[video_track(1, "V_TEST", 640, 480)]),
        ],
    );
    let mut demuxer = MatroskaDemuxer::new(Cursor::new(data));
    let mut asset = Asset::default();
    demuxer.read_header(&mut asset).unwrap();

    assert!(asset.video_data);
    assert_eq!(asset.layers, 1);
    assert_eq!(asset.width, 640);
    assert_eq!(asset.height, 480);
    assert!(!asset.audio_data);
    assert_eq!(demuxer.state(), ParseState::Ready);
    assert_eq!(demuxer.tracks()[0].uid, 1000);
}

#[test]
fn test_cue_index_points_at_clusters() {
    let tracks = master(
        ids::TRACKS,
        &[
            video_track(1, "V_VP9", 1280, 720),
            audio_track(2, "A_OPUS", 48000.0, 2),
        ],
    );
    let clusters = [(0, cluster(0, 2)), (80, cluster(80, 3))];
    let data = document("webm", &indexed_payload(tracks, &clusters));

    let mut demuxer = MatroskaDemuxer::new(Cursor::new(data.clone()));
    let mut asset = Asset::default();
    demuxer.read_header(&mut asset).unwrap();
    assert!(asset.video_data && asset.audio_data);
    assert_eq!(asset.channels, 2);

    let index = demuxer.index().unwrap().to_vec();
    assert_eq!(index.len(), 2);
    assert_eq!(index[1].time, 80);
    assert_eq!(index[1].time_ns(demuxer.segment().info.time_scale), 80_000_000);
    for entry in &index {
        let at = entry.positions[0].byte_offset as usize;
        assert_eq!(data[at..at + 4], ids::CLUSTER.to_be_bytes());
    }

    let mut timecodes = Vec::new();
    while let Some(c) = demuxer.next_cluster().unwrap() {
        timecodes.push((c.timecode, c.blocks.len()));
    }
    assert_eq!(timecodes, vec![(0, 2), (80, 3)]);
}

#[test]
fn test_unknown_length_segment_and_clusters() {
    let mut data = ebml_header("webm");
    data.extend(unknown_master(
        ids::SEGMENT,
        &[
            info(1_000_000),
            master(ids::TRACKS, &[video_track(1, "V_VP8", 320, 180)]),
            unknown_master(
                ids::CLUSTER,
                &[
                    uint(ids::CLUSTER_TIMECODE, 0),
                    simple_block(1, 0, true, &[1]),
                    simple_block(1, 33, false, &[2]),
                ],
            ),
            unknown_master(
                ids::CLUSTER,
                &[uint(ids::CLUSTER_TIMECODE, 66), simple_block(1, 0, false, &[3])],
            ),
        ],
    ));

    let mut demuxer = MatroskaDemuxer::new(Cursor::new(data));
    let mut asset = Asset::default();
    demuxer.read_header(&mut asset).unwrap();
    assert_eq!((asset.width, asset.height), (320, 180));

    let first = demuxer.next_cluster().unwrap().unwrap();
    assert_eq!(first.timecode, 0);
    assert_eq!(first.blocks.len(), 2);
    assert!(first.blocks[0].is_keyframe());
    assert!(!first.blocks[1].is_keyframe());
    assert_eq!(first.blocks[1].header().unwrap().timecode, 33);

    let second = demuxer.next_cluster().unwrap().unwrap();
    assert_eq!(second.timecode, 66);
    assert_eq!(second.blocks[0].data.data()[4], 3);

    assert!(demuxer.next_cluster().unwrap().is_none());
}

#[test]
fn test_resync_over_garbage() {
    // DocTypeVersion ID followed by an invalid length byte
    let garbage = vec![0x42, 0x87, 0x00, 0x00, 0x00];
    let data = document(
        "matroska",
        &[
            info(1_000_000),
            garbage,
            master(ids::TRACKS, &[audio_track(1, "A_AAC", 44100.0, 6)]),
            cluster(0, 1),
        ],
    );

    let mut demuxer = MatroskaDemuxer::new(Cursor::new(data));
    let mut asset = Asset::default();
    demuxer.read_header(&mut asset).unwrap();

    assert_eq!(demuxer.tracks().len(), 1);
    assert_eq!(asset.channels, 6);
    assert_eq!(asset.sample_rate, 44100.0);
    assert_eq!(demuxer.next_cluster().unwrap().unwrap().blocks.len(), 1);
}

#[test]
fn test_truncated_codec_private_is_unrecoverable() {
    let track = master(
        ids::TRACK_ENTRY,
        &[
            uint(ids::TRACK_NUMBER, 1),
            uint(ids::TRACK_TYPE, 1),
            string(ids::CODEC_ID, "V_MPEG4/ISO/AVC"),
            element(ids::CODEC_PRIVATE, &[0x01; 64]),
        ],
    );
    let mut data = document("matroska", &[master(ids::TRACKS, &[track])]);
    data.truncate(data.len() - 32);

    let mut demuxer = MatroskaDemuxer::new(Cursor::new(data));
    let err = demuxer.read_header(&mut Asset::default()).unwrap_err();
    assert!(matches!(err, MkvError::Unrecoverable { .. }));
    assert!(err.is_fatal());
    assert_eq!(demuxer.state(), ParseState::Unrecoverable);
}

#[test]
fn test_gzip_file_to_json() {
    let data = document(
        "matroska",
        &[
            info(1_000_000),
            master(
                ids::TRACKS,
                &[master(
                    ids::TRACK_ENTRY,
                    &[
                        uint(ids::TRACK_NUMBER, 1),
                        uint(ids::TRACK_TYPE, 1),
                        string(ids::CODEC_ID, "V_TEST"),
                        element(ids::CODEC_PRIVATE, &[9, 9, 9]),
                        master(
                            ids::TRACK_VIDEO,
                            &[uint(ids::VIDEO_PIXEL_WIDTH, 640), uint(ids::VIDEO_PIXEL_HEIGHT, 480)],
                        ),
                    ],
                )],
            ),
        ],
    );

    let path = std::env::temp_dir().join(format!("mkv-integration-{}.mkv.gz", std::process::id()));
    {
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(&data).unwrap();
        encoder.finish().unwrap();
    }

    let mut reader = mkv::open_mkv(&path).expect("failed to open gzip file");
    let parsed = mkv::parse_mkv(&mut reader).expect("failed to parse gzip file");
    std::fs::remove_file(&path).unwrap();

    let json = serde_json::to_value(&parsed).unwrap();
    assert_eq!(json["asset"]["width"], 640);
    assert_eq!(json["header"]["doctype"], "matroska");
    assert_eq!(json["segment"]["info"]["muxing_app"], "synthetic");
    let codec_private = &json["segment"]["tracks"][0]["codec_private"];
    assert_eq!(codec_private["length"], 3);
    assert!(codec_private.get("data").is_none());
}
