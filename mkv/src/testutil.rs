use crate::ids;

pub fn id(id: u32) -> Vec<u8> {
    let bytes = id.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count().min(3);
    bytes[skip..].to_vec()
}

/// Shortest length encoding for `len`.
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

/// Master element with the 1-byte unknown-length marker.
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

pub fn sint(element_id: u32, value: i64) -> Vec<u8> {
    element(element_id, &value.to_be_bytes())
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
            uint(ids::EBML_MAX_ID_LENGTH, 4),
            uint(ids::EBML_MAX_SIZE_LENGTH, 8),
            string(ids::DOCTYPE, doctype),
            uint(ids::DOCTYPE_VERSION, 4),
            uint(ids::DOCTYPE_READ_VERSION, 2),
        ],
    )
}

pub fn video_track(number: u64, codec: &str, width: u64, height: u64) -> Vec<u8> {
    master(
        ids::TRACK_ENTRY,
        &[
            uint(ids::TRACK_NUMBER, number),
            uint(ids::TRACK_TYPE, 1),
            string(ids::CODEC_ID, codec),
            master(
                ids::TRACK_VIDEO,
                &[uint(ids::VIDEO_PIXEL_WIDTH, width), uint(ids::VIDEO_PIXEL_HEIGHT, height)],
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

pub fn seek_entry(target: u32, position: u64) -> Vec<u8> {
    master(
        ids::SEEK_ENTRY,
        &[element(ids::SEEK_ID, &id(target)), uint(ids::SEEK_POSITION, position)],
    )
}
