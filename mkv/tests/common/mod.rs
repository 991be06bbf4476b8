//! Builds small synthetic Matroska documents.
#![allow(dead_code)]

use mkv::ids;

pub fn id(element_id: u32) -> Vec<u8> {
    let bytes = element_id.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count().min(3);
    bytes[skip..].to_vec()
}

pub fn size(len: u64) -> Vec<u8> {
    let mut width = 1;
    while width < 8 && len >= (1u64 << (7 * width)) - 1 {
        width += 1;
    }
    let marked = len | 1 << (7 * width);
    marked.to_be_bytes()[8 - width..].to_vec()
}

pub fn element(element_id: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = id(element_id);
    out.extend(size(payload.len() as u64));
    out.extend_from_slice(payload);
    out
}

pub fn master(element_id: u32, children: &[Vec<u8>]) -> Vec<u8> {
    element(element_id, &children.concat())
}

pub fn unknown_master(element_id: u32, children: &[Vec<u8>]) -> Vec<u8> {
    let mut out = id(element_id);
    out.push(0xFF);
    out.extend(children.concat());
    out
}

pub fn uint(element_id: u32, value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count().min(7);
    element(element_id, &bytes[skip..])
}

pub fn float(element_id: u32, value: f64) -> Vec<u8> {
    element(element_id, &value.to_be_bytes())
}

pub fn string(element_id: u32, value: &str) -> Vec<u8> {
    element(element_id, value.as_bytes())
}

pub fn ebml_header(doctype: &str) -> Vec<u8> {
    master(
        ids::EBML_HEADER,
        &[
            uint(ids::EBML_VERSION, 1),
            uint(ids::EBML_READ_VERSION, 1),
            string(ids::DOCTYPE, doctype),
            uint(ids::DOCTYPE_VERSION, 4),
            uint(ids::DOCTYPE_READ_VERSION, 2),
        ],
    )
}

pub fn info(time_scale: u64) -> Vec<u8> {
    master(
        ids::INFO,
        &[
            uint(ids::TIMECODE_SCALE, time_scale),
            float(ids::DURATION, 2000.0),
            string(ids::MUXING_APP, "synthetic"),
        ],
    )
}

pub fn video_track(number: u64, codec: &str, width: u64, height: u64) -> Vec<u8> {
    master(
        ids::TRACK_ENTRY,
        &[
            uint(ids::TRACK_NUMBER, number),
            uint(ids::TRACK_UID, number * 1000),
            uint(ids::TRACK_TYPE, 1),
            string(ids::CODEC_ID, codec),
            master(
                ids::TRACK_VIDEO,
                &[
                    uint(ids::VIDEO_PIXEL_WIDTH, width),
                    uint(ids::VIDEO_PIXEL_HEIGHT, height),
                ],
            ),
        ],
    )
}

pub fn audio_track(number: u64, codec: &str, rate: f64, channels: u64) -> Vec<u8> {
    master(
        ids::TRACK_ENTRY,
        &[
            uint(ids::TRACK_NUMBER, number),
            uint(ids::TRACK_TYPE, 2),
            string(ids::CODEC_ID, codec),
            master(
                ids::TRACK_AUDIO,
                &[float(ids::AUDIO_SAMPLING_FREQ, rate), uint(ids::AUDIO_CHANNELS, channels)],
            ),
        ],
    )
}

/// SimpleBlock payload: track number, relative timecode, flags, then data.
pub fn simple_block(track: u8, timecode: i16, keyframe: bool, data: &[u8]) -> Vec<u8> {
    let mut payload = vec![0x80 | track];
    payload.extend(timecode.to_be_bytes());
    payload.push(if keyframe { 0x80 } else { 0x00 });
    payload.extend_from_slice(data);
    element(ids::SIMPLE_BLOCK, &payload)
}

pub fn cue_point(time: u64, track: u64, cluster_position: u64) -> Vec<u8> {
    master(
        ids::CUE_POINT,
        &[
            uint(ids::CUE_TIME, time),
            master(
                ids::CUE_TRACK_POSITIONS,
                &[
                    uint(ids::CUE_TRACK, track),
                    uint(ids::CUE_CLUSTER_POSITION, cluster_position),
                ],
            ),
        ],
    )
}

pub fn document(doctype: &str, segment_payload: &[Vec<u8>]) -> Vec<u8> {
    let mut data = ebml_header(doctype);
    data.extend(master(ids::SEGMENT, segment_payload));
    data
}
