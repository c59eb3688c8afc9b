use super::types::{
    Clip, Header, MarkType, Mpls, PlayItem, PlayList, PlayListMark, StreamInfo, StreamKind,
    StreamTable, TimeStamp,
};
use super::MplsError;
use nom::{
    bytes::complete::{tag, take},
    multi::{count, length_data},
    number::complete::{be_u16, be_u32, be_u8},
    IResult,
};

fn text(len: usize, input: &[u8]) -> IResult<&[u8], String> {
    let (input, bytes) = take(len)(input)?;
    Ok((input, String::from_utf8_lossy(bytes).into_owned()))
}

// "MPLS", version, then the three section addresses and 20 reserved bytes
fn header(input: &[u8]) -> IResult<&[u8], Header> {
    let (input, _) = tag("MPLS")(input)?;
    let (input, version) = text(4, input)?;
    let (input, play_list_start) = be_u32(input)?;
    let (input, play_list_mark_start) = be_u32(input)?;
    let (input, ext_data_start) = be_u32(input)?;
    let (input, _) = take(20usize)(input)?;

    Ok((
        input,
        Header {
            version,
            play_list_start,
            play_list_mark_start,
            ext_data_start,
        },
    ))
}

fn time_stamp(input: &[u8]) -> IResult<&[u8], TimeStamp> {
    let (input, t) = be_u32(input)?;
    Ok((input, TimeStamp(t)))
}

fn clip(input: &[u8]) -> IResult<&[u8], Clip> {
    let (input, file_name) = text(5, input)?;
    let (input, codec_id) = text(4, input)?;
    Ok((input, Clip { file_name, codec_id }))
}

fn angle_clip(input: &[u8]) -> IResult<&[u8], Clip> {
    let (input, clip) = clip(input)?;
    // RefToSTCID
    let (input, _) = be_u8(input)?;
    Ok((input, clip))
}

fn angles(input: &[u8]) -> IResult<&[u8], Vec<Clip>> {
    let (input, n_angles) = be_u8(input)?;
    // is_different_audios / is_seamless_angle_change
    let (input, _) = be_u8(input)?;
    count(angle_clip, (n_angles as usize).saturating_sub(1))(input)
}

fn language_code(input: &[u8]) -> IResult<&[u8], Option<String>> {
    let (input, code) = text(3, input)?;
    Ok((input, Some(code)))
}

fn stream_attributes(input: &[u8]) -> IResult<&[u8], StreamInfo> {
    let (input, coding_type) = be_u8(input)?;
    let kind = StreamKind::from_coding_type(coding_type);
    let (input, language) = match kind {
        StreamKind::Audio | StreamKind::Text => {
            // audio format + sample rate, or the character code
            let (input, _) = be_u8(input)?;
            language_code(input)?
        }
        StreamKind::Graphics => language_code(input)?,
        StreamKind::Video | StreamKind::Unknown => (input, None),
    };

    Ok((
        input,
        StreamInfo {
            coding_type,
            kind,
            language,
        },
    ))
}

fn stream(input: &[u8]) -> IResult<&[u8], StreamInfo> {
    let (input, _entry) = length_data(be_u8)(input)?;
    let (input, attrs) = length_data(be_u8)(input)?;
    let (_, info) = stream_attributes(attrs)?;
    Ok((input, info))
}

fn stream_table(input: &[u8]) -> IResult<&[u8], StreamTable> {
    let (rest, body) = length_data(be_u16)(input)?;
    let (body, _) = take(2usize)(body)?;
    let (body, n_video) = be_u8(body)?;
    let (body, n_audio) = be_u8(body)?;
    let (body, n_pg) = be_u8(body)?;
    let (body, n_ig) = be_u8(body)?;
    // secondary audio/video and PiP counts, reserved
    let (body, _) = take(8usize)(body)?;

    let (body, video) = count(stream, n_video as usize)(body)?;
    let (body, audio) = count(stream, n_audio as usize)(body)?;
    let (body, subtitles) = count(stream, n_pg as usize)(body)?;
    let (_, interactive_graphics) = count(stream, n_ig as usize)(body)?;

    Ok((
        rest,
        StreamTable {
            video,
            audio,
            subtitles,
            interactive_graphics,
        },
    ))
}

fn play_item(input: &[u8]) -> IResult<&[u8], PlayItem> {
    let (rest, body) = length_data(be_u16)(input)?;
    let (body, clip) = clip(body)?;
    let (body, flags) = be_u16(body)?;
    // 0000 0000 000X .... <-- is_multi_angle, followed by connection_condition
    let is_multi_angle = (flags >> 4) & 1 == 1;
    // RefToSTCID
    let (body, _) = be_u8(body)?;
    let (body, in_time) = time_stamp(body)?;
    let (body, out_time) = time_stamp(body)?;
    // UO mask, random access flag, still mode, still time
    let (body, _) = take(12usize)(body)?;
    let (body, angles) = if is_multi_angle {
        angles(body)?
    } else {
        (body, Vec::new())
    };
    let (_, streams) = stream_table(body)?;

    Ok((
        rest,
        PlayItem {
            clip,
            angles,
            in_time,
            out_time,
            streams,
        },
    ))
}

fn play_list(input: &[u8]) -> IResult<&[u8], PlayList> {
    let (rest, body) = length_data(be_u32)(input)?;
    let (body, _) = take(2usize)(body)?;
    let (body, n_play_items) = be_u16(body)?;
    let (body, _n_sub_paths) = be_u16(body)?;
    let (_, play_items) = count(play_item, n_play_items as usize)(body)?;
    Ok((rest, PlayList { play_items }))
}

fn mark(input: &[u8]) -> IResult<&[u8], PlayListMark> {
    let (input, _) = be_u8(input)?;
    let (input, raw_type) = be_u8(input)?;
    let (input, play_item) = be_u16(input)?;
    let (input, time_stamp) = time_stamp(input)?;
    // EntryESPID and duration
    let (input, _) = take(6usize)(input)?;

    let mark_type = match raw_type {
        0x1 => MarkType::EntryPoint,
        0x2 => MarkType::LinkPoint,
        _ => MarkType::Unknown,
    };
    Ok((
        input,
        PlayListMark {
            mark_type,
            play_item,
            time_stamp,
        },
    ))
}

fn play_list_marks(input: &[u8]) -> IResult<&[u8], Vec<PlayListMark>> {
    let (rest, body) = length_data(be_u32)(input)?;
    let (body, n_marks) = be_u16(body)?;
    let (_, marks) = count(mark, n_marks as usize)(body)?;
    Ok((rest, marks))
}

fn section<'a>(input: &'a [u8], offset: u32, name: &'static str) -> Result<&'a [u8], MplsError> {
    match input.get(offset as usize..) {
        Some(body) if !body.is_empty() => Ok(body),
        _ => Err(MplsError::OffsetOutOfRange {
            section: name,
            offset,
        }),
    }
}

pub fn parse_mpls(input: &[u8]) -> Result<Mpls, MplsError> {
    let (_, header) = header(input).map_err(|_| MplsError::ParseError("header"))?;

    let body = section(input, header.play_list_start, "playlist")?;
    let (_, play_list) = play_list(body).map_err(|_| MplsError::ParseError("playlist"))?;

    let marks = if header.play_list_mark_start == 0 {
        Vec::new()
    } else {
        let body = section(input, header.play_list_mark_start, "playlist marks")?;
        let (_, marks) =
            play_list_marks(body).map_err(|_| MplsError::ParseError("playlist marks"))?;
        marks
    };

    Ok(Mpls {
        header,
        play_list,
        marks,
    })
}
