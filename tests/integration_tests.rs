mod common;

use std::fs;

use common::{bluray_disc, FakeGenerator, FakeInspector, FakeProvider, MplsBuilder, BDINFO_REPORT};
use discparse::bdinfo;
use discparse::bluray;
use discparse::dvd::SizeClass;
use discparse::mpls::{MarkType, Mpls, MplsError};
use discparse::pipeline::{discover, Pipeline, RunDirectory};
use discparse::select::SelectionPolicy;
use discparse::{Config, Disc, DiscKind, Error, ErrorKind};
use serde_json::json;

#[test]
fn complete_playlist() {
    let bytes = MplsBuilder::new()
        .item("00055", 3600)
        .item("00059", 1800)
        .item("00061", 30)
        .mark(0, 0)
        .mark(1, 600)
        .build();

    let mpls = Mpls::parse(&bytes).unwrap();
    assert_eq!(mpls.header.version, "0300");
    assert_eq!(mpls.play_list.play_items.len(), 3);
    assert_eq!(mpls.duration(), 5430.0);

    let segments: Vec<String> = mpls
        .play_list
        .play_items
        .iter()
        .map(|i| i.clip.stream_file_name())
        .collect();
    assert_eq!(segments, ["00055.m2ts", "00059.m2ts", "00061.m2ts"]);

    assert_eq!(mpls.marks.len(), 2);
    assert_eq!(mpls.marks[1].mark_type, MarkType::EntryPoint);
    assert_eq!(mpls.chapters(), vec![0, 4_200_000]);
}

#[test]
fn complete_from_reader() {
    let bytes = MplsBuilder::new().item("00001", 700).build();
    let mpls = Mpls::from(&bytes[..]).unwrap();
    assert_eq!(mpls.duration(), 700.0);
    assert!(mpls.chapters().is_empty());
}

#[test]
fn truncated_playlist_fails() {
    let bytes = MplsBuilder::new().item("00001", 700).build();
    assert!(Mpls::parse(&bytes[..60]).is_err());
    assert!(matches!(
        Mpls::parse(&bytes[..40]),
        Err(MplsError::OffsetOutOfRange { .. })
    ));
    assert!(matches!(
        Mpls::parse(b"MPLS"),
        Err(MplsError::ParseError("header"))
    ));
}

fn sample_bluray(root: &std::path::Path) {
    bluray_disc(
        root,
        &[
            (
                "00001.mpls",
                MplsBuilder::new()
                    .item("00001", 3600)
                    .item("00002", 1800)
                    .mark(0, 0)
                    .mark(1, 600)
                    .build(),
            ),
            (
                "00002.mpls",
                MplsBuilder::new()
                    .item("00001", 3600)
                    .item("00001", 3600)
                    .item("00002", 1800)
                    .build(),
            ),
            ("00003.mpls", MplsBuilder::new().item("00003", 300).build()),
            ("00004.mpls", MplsBuilder::new().item("00004", 700).build()),
            ("00005.mpls", b"NOT A PLAYLIST".to_vec()),
        ],
        &[
            ("00001.m2ts", 1000),
            ("00002.m2ts", 500),
            ("00003.m2ts", 100),
            ("00004.M2TS", 200),
        ],
    );
}

#[test]
fn scan_keeps_clean_long_playlists() {
    let root = tempfile::tempdir().unwrap();
    sample_bluray(root.path());

    let candidates = bluray::scan(&root.path().join("BDMV")).unwrap();
    let ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["00001.mpls", "00004.mpls"]);

    let main = &candidates[0];
    assert_eq!(main.duration, 5400.0);
    assert_eq!(main.total_size(), 1500);
    assert_eq!(main.chapters.len(), 2);
    assert_eq!(main.chapters[1].millis, 4_200_000);

    let upper = &candidates[1];
    assert_eq!(upper.clips[0].file, root.path().join("BDMV/STREAM/00004.M2TS"));
}

#[test]
fn scan_requires_playlist_directory() {
    let root = tempfile::tempdir().unwrap();
    let err = bluray::scan(root.path()).unwrap_err();
    assert!(matches!(err, Error::NoPlaylistDirectory { .. }));
    assert_eq!(err.kind(), ErrorKind::Structural);
}

#[test]
fn full_bdinfo_report() {
    let report = bdinfo::parse_output(BDINFO_REPORT, std::path::Path::new("/discs/MOVIE")).unwrap();
    assert_eq!(report.title, "Example Movie");
    assert_eq!(report.playlist, "00001");
    assert_eq!(report.length, "1:30:00");
    assert_eq!(report.audio[0].object_audio, "Atmos Audio");
    assert_eq!(report.files.len(), 2);
    assert_eq!(report.files[1].file, "00002.M2TS");
    assert!(report.extended_summary.starts_with("Name:"));
    assert!(report.extended_summary.ends_with("30.33 Mbps"));
    assert!(report.summary.ends_with("31.123 kbps"));
}

fn config(work: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.work_dir = work.to_path_buf();
    config.bdinfo.retry_delay_secs = 0;
    config
}

#[test]
fn bluray_pipeline_largest_playlist() {
    let work = tempfile::tempdir().unwrap();
    let disc_root = tempfile::tempdir().unwrap();
    sample_bluray(disc_root.path());

    let mut config = config(work.path());
    config.use_largest_playlist = true;
    let run = RunDirectory::create(work.path(), Some("run")).unwrap();
    let inspector = FakeInspector::default();
    let generator = FakeGenerator::default();

    let pipeline = Pipeline::new(config.clone(), run.clone(), &inspector, &generator);
    let discs = discover(&[disc_root.path()]).unwrap();
    let outcomes = pipeline.process_batch(discs);

    assert!(outcomes[0].is_ok());
    let disc = &outcomes[0].disc;
    assert_eq!(disc.playlists.len(), 1);
    assert_eq!(disc.playlists[0].id, "00001.mpls");
    assert_eq!(disc.reports[0].title, "Example Movie");
    assert_eq!(disc.reports[0].edition, None);
    assert!(disc.size >= 1800);

    assert!(run.file("Disc1_00001_FULL.txt").is_file());
    let summary = fs::read_to_string(run.file("BD_SUMMARY_00.txt")).unwrap();
    assert!(summary.starts_with("Disc Title: Example Movie"));
    let extended = fs::read_to_string(run.file("BD_SUMMARY_EXT_00.txt")).unwrap();
    assert!(extended.starts_with("Name:"));

    let saved: Disc = serde_json::from_str(&fs::read_to_string(run.file("DISC_00.json")).unwrap()).unwrap();
    assert_eq!(saved.kind, DiscKind::BluRay);
    assert_eq!(saved.reports[0].playlist, "00001");

    // second run reuses the full report
    let again = Pipeline::new(config, run, &inspector, &generator);
    let outcomes = again.process_batch(discover(&[disc_root.path()]).unwrap());
    assert!(outcomes[0].is_ok());
    assert_eq!(generator.call_count(), 1);
}

#[test]
fn bluray_pipeline_all_playlists_with_editions() {
    let work = tempfile::tempdir().unwrap();
    let disc_root = tempfile::tempdir().unwrap();
    sample_bluray(disc_root.path());

    let run = RunDirectory::create(work.path(), Some("run")).unwrap();
    let inspector = FakeInspector::default();
    let generator = FakeGenerator::default();
    let mut provider = FakeProvider::new(SelectionPolicy::All);
    provider.edition = Some(" Director's Cut ".to_string());

    let pipeline = Pipeline::new(config(work.path()), run.clone(), &inspector, &generator)
        .with_provider(&provider);
    assert_eq!(pipeline.policy(), &SelectionPolicy::Interactive);

    let outcomes = pipeline.process_batch(discover(&[disc_root.path()]).unwrap());
    let disc = &outcomes[0].disc;
    assert_eq!(provider.asked.get(), 1);
    assert_eq!(disc.reports.len(), 2);
    assert_eq!(disc.reports[1].edition.as_deref(), Some("Director's Cut"));
    assert!(run.file("BD_SUMMARY_00_1.txt").is_file());
    assert!(run.file("BD_SUMMARY_EXT_00_1.txt").is_file());
    assert!(run.file("Disc1_00004_FULL.txt").is_file());
}

#[test]
fn unattended_run_skips_editions() {
    let work = tempfile::tempdir().unwrap();
    let disc_root = tempfile::tempdir().unwrap();
    sample_bluray(disc_root.path());

    let mut config = config(work.path());
    config.unattended = true;
    let run = RunDirectory::create(work.path(), None).unwrap();
    let inspector = FakeInspector::default();
    let generator = FakeGenerator::default();
    let mut provider = FakeProvider::new(SelectionPolicy::All);
    provider.edition = Some("Extended".to_string());

    let pipeline = Pipeline::new(config, run, &inspector, &generator).with_provider(&provider);
    let outcomes = pipeline.process_batch(discover(&[disc_root.path()]).unwrap());

    assert_eq!(provider.asked.get(), 0);
    assert_eq!(outcomes[0].disc.playlists[0].id, "00001.mpls");
    assert_eq!(outcomes[0].disc.reports.len(), 1);
}

#[test]
fn missing_report_skips_playlist_after_retry() {
    let work = tempfile::tempdir().unwrap();
    let disc_root = tempfile::tempdir().unwrap();
    sample_bluray(disc_root.path());

    let mut config = config(work.path());
    config.use_largest_playlist = true;
    let run = RunDirectory::create(work.path(), Some("run")).unwrap();
    let inspector = FakeInspector::default();
    let generator = FakeGenerator::silent();

    let pipeline = Pipeline::new(config, run.clone(), &inspector, &generator);
    let outcomes = pipeline.process_batch(discover(&[disc_root.path()]).unwrap());

    assert!(outcomes[0].is_ok());
    assert_eq!(generator.call_count(), 2);
    assert!(outcomes[0].disc.reports.is_empty());
    assert!(!run.file("BD_SUMMARY_00.txt").exists());
}

const VOB_TEXT: &str = "General
Complete name                            : {dir}/VTS_02_1.VOB
Format                                   : MPEG-PS
File size                                : 1.00 GiB
Overall bit rate                         : 9 800 kb/s

Video
ID                                       : 224 (0xE0)
Format                                   : MPEG Video

Audio
ID                                       : 189 (0xBD)-128 (0x80)
Format                                   : AC-3
";

const IFO_TEXT: &str = "General
Complete name                            : {dir}/VTS_02_0.IFO
Format                                   : DVD Video
File size                                : 20.0 KiB
Duration                                 : 2 h 0 min

Video
Display aspect ratio                     : 16:9

Menu
Format                                   : DVD-Video
";

fn dvd_disc(root: &std::path::Path) -> std::path::PathBuf {
    let dir = root.join("VIDEO_TS");
    fs::create_dir_all(&dir).unwrap();
    for (name, size) in [
        ("VTS_01_0.IFO", 10),
        ("VTS_01_1.VOB", 100),
        ("VTS_02_0.IFO", 10),
        ("VTS_02_1.VOB", 1000),
        ("VTS_02_2.VOB", 1000),
        ("VTS_03_0.IFO", 10),
        ("VTS_03_1.VOB", 100),
    ] {
        fs::write(dir.join(name), vec![0u8; size]).unwrap();
    }
    dir
}

fn dvd_inspector(dir: &std::path::Path) -> FakeInspector {
    let dir = dir.to_string_lossy();
    FakeInspector::default()
        .with_json("VTS_01_0.IFO", json!({"media": {"track": [{}, {"Duration": "120.000"}]}}))
        .with_json("VTS_02_0.IFO", json!({"media": {"track": [{}, {"Duration": "7200.000"}]}}))
        .with_json("VTS_03_0.IFO", json!({"media": {"track": [{}]}}))
        .with_text("VTS_02_1.VOB", &VOB_TEXT.replace("{dir}", &dir))
        .with_text("VTS_02_0.IFO", &IFO_TEXT.replace("{dir}", &dir))
}

#[test]
fn dvd_pipeline_merges_main_title_set() {
    let work = tempfile::tempdir().unwrap();
    let disc_root = tempfile::tempdir().unwrap();
    let dir = dvd_disc(disc_root.path());

    let run = RunDirectory::create(work.path(), Some("run")).unwrap();
    let inspector = dvd_inspector(&dir);
    let generator = FakeGenerator::default();
    let pipeline = Pipeline::new(config(work.path()), run.clone(), &inspector, &generator);

    let outcomes = pipeline.process_batch(discover(&[disc_root.path()]).unwrap());
    assert!(outcomes[0].is_ok());

    let disc = &outcomes[0].disc;
    assert_eq!(disc.size, 2230);
    assert_eq!(disc.size_gib, Some(0.0));
    assert_eq!(disc.size_class, Some(SizeClass::Dvd5));

    let text = fs::read_to_string(run.file("DVD_MEDIAINFO_00.txt")).unwrap();
    assert_eq!(disc.mediainfo.as_deref(), Some(text.as_str()));
    assert!(text.starts_with("General\nComplete name                            : VTS_02_0.IFO\n"));
    assert!(text.contains("File size                                : 0 GiB\n"));
    assert!(text.contains("Overall bit rate                         : 9 800 kb/s\n"));
    assert!(text.contains("Display aspect ratio                     : 16:9\n"));

    let order: Vec<&str> = text
        .lines()
        .filter(|l| !l.is_empty() && !l.contains(':'))
        .collect();
    assert_eq!(order, ["General", "Video", "Audio", "Menu"]);
    assert!(generator.calls.borrow().is_empty());
}

#[test]
fn batch_continues_after_failed_disc() {
    let work = tempfile::tempdir().unwrap();
    let broken = tempfile::tempdir().unwrap();
    fs::create_dir(broken.path().join("BDMV")).unwrap();
    let disc_root = tempfile::tempdir().unwrap();
    let dir = dvd_disc(disc_root.path());

    let run = RunDirectory::create(work.path(), Some("run")).unwrap();
    let inspector = dvd_inspector(&dir);
    let generator = FakeGenerator::default();
    let pipeline = Pipeline::new(config(work.path()), run.clone(), &inspector, &generator);

    let outcomes = pipeline.process_batch(discover(&[broken.path(), disc_root.path()]).unwrap());
    assert_eq!(outcomes.len(), 2);

    let err = outcomes[0].result.as_ref().unwrap_err();
    assert!(matches!(err, Error::NoPlaylistDirectory { .. }));
    assert!(outcomes[1].is_ok());
    assert!(run.file("DVD_MEDIAINFO_01.txt").is_file());
    assert!(!run.file("DISC_00.json").exists());
}

const XPL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Playlist xmlns="http://www.dvdforum.org/2005/HDDVDVideo/Playlist" majorVersion="1" minorVersion="0">
  <TitleSet>
    <Title titleNumber="1" id="Feature" description="Main feature" titleDuration="01:45:30:12" displayName="Main">
      <PrimaryAudioVideoClip src="file:///dvddisc/HVDVD_TS/FEATURE_1.MAP" titleTimeBegin="00:00:00:00" titleTimeEnd="01:00:00:00"/>
      <PrimaryAudioVideoClip src="file:///dvddisc/HVDVD_TS/FEATURE_2.MAP" titleTimeBegin="01:00:00:00" titleTimeEnd="01:45:30:12"/>
      <ChapterList>
        <Chapter displayName="Opening" titleTimeBegin="00:00:00:00"/>
        <Chapter titleTimeBegin="00:10:00:12"/>
      </ChapterList>
      <TrackNavigationList>
        <AudioTrack track="1" langcode="en"/>
        <AudioTrack track="2" langcode="fr"/>
        <SubtitleTrack track="1" langcode="de"/>
      </TrackNavigationList>
    </Title>
  </TitleSet>
</Playlist>"#;

const EVO_1: &str = "General
Complete name                            : FEATURE_1.EVO
Format                                   : MPEG-PS
File size                                : 1.00 KiB
Duration                                 : 1 h 0 min

Video
ID                                       : 224 (0xE0)
Format                                   : VC-1

Audio
ID                                       : 189 (0xBD)-128 (0x80)
Format                                   : AC-3
Compression mode                         : Lossy
";

const EVO_2: &str = "General
Complete name                            : FEATURE_2.EVO
Format                                   : MPEG-PS

Video
ID                                       : 224 (0xE0)
Format                                   : VC-1

Audio
ID                                       : 189 (0xBD)-129 (0x81)
Format                                   : DTS
Compression mode                         : Lossy

Text
ID                                       : 189 (0xBD)-32 (0x20)
Format                                   : RLE
";

fn hddvd_disc(root: &std::path::Path, with_playlist: bool) {
    let dir = root.join("HVDVD_TS");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("FEATURE_1.EVO"), vec![0u8; 600]).unwrap();
    fs::write(dir.join("FEATURE_2.EVO"), vec![0u8; 400]).unwrap();
    fs::write(dir.join("FEATURE_1.MAP"), vec![0u8; 10]).unwrap();
    if with_playlist {
        fs::create_dir_all(root.join("ADV_OBJ")).unwrap();
        fs::write(root.join("ADV_OBJ").join("VPLST000.XPL"), XPL).unwrap();
    }
}

#[test]
fn hddvd_pipeline_merges_title() {
    let work = tempfile::tempdir().unwrap();
    let disc_root = tempfile::tempdir().unwrap();
    hddvd_disc(disc_root.path(), true);

    let run = RunDirectory::create(work.path(), Some("run")).unwrap();
    let inspector = FakeInspector::default()
        .with_text("FEATURE_1.EVO", EVO_1)
        .with_text("FEATURE_2.EVO", EVO_2)
        .with_json(
            "FEATURE_1.EVO",
            json!({
                "creatingLibrary": {"name": "MediaInfoLib"},
                "media": {"@ref": "FEATURE_1.EVO", "track": [
                    {"@type": "General", "FileSize": "600", "Title": "dropped"},
                    {"@type": "Audio", "StreamOrder": "0"}
                ]}
            }),
        );
    let generator = FakeGenerator::default();
    let pipeline = Pipeline::new(config(work.path()), run.clone(), &inspector, &generator);

    let outcomes = pipeline.process_batch(discover(&[disc_root.path()]).unwrap());
    assert!(outcomes[0].is_ok());
    assert_eq!(outcomes[0].disc.title.as_deref(), Some("Main"));

    let text = fs::read_to_string(run.file("MEDIAINFO.txt")).unwrap();
    let expected = "General
Complete name                            : FEATURE_1.EVO
Format                                   : MPEG-PS
File size                                : 0.00 GiB
Duration                                 : 1 h 45 min

Video
ID                                       : 224 (0xE0)
Format                                   : VC-1

Audio #1
ID                                       : 189 (0xBD)-128 (0x80)
Format                                   : AC-3
Compression mode                         : Lossy
Language                                 : English

Audio #2
ID                                       : 189 (0xBD)-129 (0x81)
Format                                   : DTS
Compression mode                         : Lossy
Language                                 : French

Text
ID                                       : 189 (0xBD)-32 (0x20)
Format                                   : RLE
Language                                 : German

Menu
Format                                   : HD DVD-Video
00:00:00.000                              : Opening
00:10:00.500                              : Chapter 2
";
    assert_eq!(text, expected);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(run.file("MEDIAINFO.json")).unwrap()).unwrap();
    let tracks = json["media"]["track"].as_array().unwrap();
    assert_eq!(tracks[0]["FileSize"], "1000");
    assert_eq!(tracks[0]["Duration"], "6330500");
    assert_eq!(tracks[0]["SourceFiles"], "FEATURE_1.EVO, FEATURE_2.EVO");
    assert!(tracks[0].get("Title").is_none());
    assert_eq!(tracks[1]["Language"], "English");
    assert_eq!(tracks[2]["Chapters"][1]["time"], 600_500);
}

#[test]
fn hddvd_without_playlist_uses_largest_evo() {
    let work = tempfile::tempdir().unwrap();
    let disc_root = tempfile::tempdir().unwrap();
    hddvd_disc(disc_root.path(), false);

    let run = RunDirectory::create(work.path(), Some("run")).unwrap();
    let inspector = FakeInspector::default().with_text("FEATURE_1.EVO", EVO_1);
    let generator = FakeGenerator::default();
    let pipeline = Pipeline::new(config(work.path()), run.clone(), &inspector, &generator);

    let outcomes = pipeline.process_batch(discover(&[disc_root.path()]).unwrap());
    assert!(outcomes[0].is_ok());
    assert_eq!(fs::read_to_string(run.file("MEDIAINFO.txt")).unwrap(), EVO_1.trim_end());
    assert!(!run.file("MEDIAINFO.json").exists());
}

#[test]
fn hddvd_pipeline_honours_configured_floor() {
    let work = tempfile::tempdir().unwrap();
    let disc_root = tempfile::tempdir().unwrap();
    hddvd_disc(disc_root.path(), false);
    let short = XPL.replace(r#"titleDuration="01:45:30:12""#, r#"titleDuration="00:05:00:00""#);
    fs::create_dir_all(disc_root.path().join("ADV_OBJ")).unwrap();
    fs::write(disc_root.path().join("ADV_OBJ").join("VPLST000.XPL"), short).unwrap();

    let inspector = FakeInspector::default()
        .with_text("FEATURE_1.EVO", EVO_1)
        .with_text("FEATURE_2.EVO", EVO_2);
    let generator = FakeGenerator::default();

    let run = RunDirectory::create(work.path(), Some("default")).unwrap();
    let pipeline = Pipeline::new(config(work.path()), run.clone(), &inspector, &generator);
    let outcomes = pipeline.process_batch(discover(&[disc_root.path()]).unwrap());
    assert!(outcomes[0].is_ok());
    assert_eq!(fs::read_to_string(run.file("MEDIAINFO.txt")).unwrap(), EVO_1.trim_end());

    let mut lowered = config(work.path());
    lowered.min_duration_secs = 300.0;
    let run = RunDirectory::create(work.path(), Some("lowered")).unwrap();
    let pipeline = Pipeline::new(lowered, run.clone(), &inspector, &generator);
    let outcomes = pipeline.process_batch(discover(&[disc_root.path()]).unwrap());
    assert!(outcomes[0].is_ok());
    assert_eq!(outcomes[0].disc.title.as_deref(), Some("Main"));

    let text = fs::read_to_string(run.file("MEDIAINFO.txt")).unwrap();
    assert!(text.contains("Duration                                 : 5 min\n"));
    assert!(text.contains("Audio #2\n"));
}
