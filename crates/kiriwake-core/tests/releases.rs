//! Corpus tests: concrete releases, structural invariants and the published
//! comparison order.

use kiriwake_core::{TagParser, TagType, Type, compare, parse_str};

/// A fixed list of diverse release names. Used for the structural
/// invariants; sorting gets its own corpus below.
fn corpus() -> Vec<&'static str> {
    vec![
        "The.Matrix.1999.1080p.BluRay.x264-GROUP.mkv",
        "The.Matrix.1999.mkv",
        "Star.Trek.Lower.Decks.S03E02.The.Least.Dangerous.Game.1080p.AMZN.WEB-DL.DDP.5.1.H.264-GNOME.mkv",
        "Star.Trek.Lower.Decks.S02.1080p.AMZN.WEB-DL.DDP5.1.H.264-NTb",
        "The_Velvet_Underground-The_Complete_Matrix_Tapes-Reissue_Limited_Edition_Boxset-8LP-2019-NOiR",
        "[PMEDIA] T-Pain - The Lost Remixes (2020) Mp3 320kbps \u{2b50}",
        "rocky ii.mkv",
        "C.S..Lewis~Die.Chroniken.von.Narnia~Der.Koenig.von.Narnia.Bd.3.2013.German.Retail.EPUB.eBook-BitBook",
        "C.S. Lewis - Die Chroniken.von.Narnia - Der.Koenig.von.Narnia.Bd.II.2013.German.Retail.EPUB.eBook-BitBook",
        "Top.Show.2020-03-04.720p.WEB.x264-GRP",
        "News.23.04.2021.WEB.x264",
        "Show.MAY-30-1992.HDTV",
        "Old.Show.17.12.15.HDTV.x264",
        "Some.Show.S01E02.720p.WEB.x264-TEAM",
        "Show.S01S02S03.COMPLETE.1080p.BluRay.x265-BOX",
        "Another.Show.2x05.HDTV.XviD",
        "Episode 15 - the one with the thing",
        "Cool.Tool.v2.4.1.WiN.x64-TiNYiSO",
        "Cyber.Heist.NSW-VENOM",
        "minesweeper.winnt",
        "super.smash.brothers.nsw",
        "Stephen.Fry.Mythos.Unabridged.AUDIOBOOK.MP3-GRP",
        "Saga.Vol.03.2014.Digital.COMIC.CBZ-GRP",
        "Learn.Rust.Fast.UDEMY.TUTORIAL-GRP",
        "Fine.Cooking.June.2020.MAGAZiNE.PDF-SCENE",
        "Faithless - Insomnia (FTLS001) (1995).mp3",
        "Prodigy - Fat of the Land (Electronic) (1997) FLAC",
        "Artist-Album-2CD-2003-GRP",
        "The.Show.S02.DVD3",
        "Movie.2022.2160p.WEB-DL.DV.HDR10.H.265-GRP",
        "Film.2019.MULTi.1080p.BluRay.x264-GRP",
        "[REQ] The.Matrix.1999.1080p.x264-GRP",
        "{{s3cret}} Some.Thing.2004.mkv",
        "My.Album.2004.FLAC [DEADBEEF]",
        "[TGx] Cool.Movie.2020.1080p.WEB.x264-GRP",
        "[[origin:usenet]] Thing.2019.mkv",
        "Show.S01E01.720p.x264.a1b2c3d4",
        "I'll.Follow.You.Down.2013.BluRay.Remux.1080p.AVC.DTS-HD.MA.5.1-HiFi.mkv",
        "The Thomas Crown Affair 1968 1080p BluRay AVC DTS-HD MA 2.0-CtrlHD",
        "The.Thomas.Crown.Affair.1968.4K.Remaster.720p.BluRay.AAC.2.0.x264-TDD.mkv",
        "X.2022.BluRay.720p.DD.2.0.x264",
        "Star Trek - Lower Decks    S03E03 Mining the Mind's Mines (1080p AMZN Webrip x265 10bit EAC3 5.1 - Goki)[TAoE].mkv",
        "Harry.Potter.and.the.Deathly.Hallows.Part.1.2010.mkv",
        "Zebra.2009.S01.FLAC-group",
        "Z\u{e9}bra.2009.S00.x264-group.mkv",
        "the cc - a - the remix 1999.mp3",
        "wait for it... 1999",
        "VLS2004.Artist.Unknown",
        "WEB2007.Something",
        "ghostbusters.afterlife.mkv",
        "ultra. vol. 13.mkv",
        "'twas the night",
        "LAWLE$$.mkv",
        "Amélie.1999.mkv",
    ]
}

#[test]
fn round_trip_original_bytes() {
    for s in corpus() {
        let r = parse_str(s);
        assert_eq!(
            r.original(),
            s.as_bytes(),
            "original render must reproduce {s:?}"
        );
    }
}

/// Round-trip, single-date and nonempty-title invariants over a few
/// thousand synthesized names covering the common shapes.
#[test]
fn synthetic_corpus_invariants() {
    let titles = [
        "Silver.Harbor",
        "Midnight_Garden",
        "The.Long.Way.Home",
        "Cold Iron",
        "Paper.Planes.and.Wire",
        "Nachtzug",
    ];
    let markers = ["1999", "2014", "S02E07", "S01", "2019-05-21", ""];
    let quality = [
        "1080p.BluRay.x264",
        "720p.WEB-DL.DDP5.1.H.264",
        "2160p.WEB.DV.HDR10.x265",
        "HDTV.XviD",
        "FLAC",
        "",
    ];
    let tail = ["-GRP", "-NOiR.mkv", ".mkv", " [ABCD1234]", "", "-iND.mp3"];
    let mut count = 0;
    for t in titles {
        for m in markers {
            for q in quality {
                for g in tail {
                    for s in [
                        format!("{t}.{m}.{q}{g}"),
                        format!("{t} {m} {q}{g}"),
                        format!("{}_{m}_{q}{g}", t.replace('.', "_")),
                    ] {
                        let r = parse_str(&s);
                        assert_eq!(
                            r.original(),
                            s.as_bytes(),
                            "round trip failed for {s:?}"
                        );
                        if r.typ != Type::Magazine {
                            let dates = r
                                .tags()
                                .iter()
                                .filter(|t| t.is(&[TagType::Date]))
                                .count();
                            assert!(dates <= 1, "{s:?} has {dates} date tags");
                        }
                        assert!(
                            r.title.as_deref().is_some_and(|t| !t.is_empty()),
                            "empty title for {s:?}"
                        );
                        count += 1;
                    }
                }
            }
        }
    }
    assert!(count > 3000, "corpus too small: {count}");
}

#[test]
fn reparse_is_idempotent() {
    for s in corpus() {
        let r = parse_str(s);
        let again = parse_str(&String::from_utf8_lossy(&r.original()));
        assert_eq!(r, again, "reparse of {s:?} must be identical");
    }
}

#[test]
fn titles_are_nonempty() {
    for s in corpus() {
        let r = parse_str(s);
        assert!(
            r.title.as_deref().is_some_and(|t| !t.is_empty()),
            "empty title for {s:?} ({:?})",
            r.typ
        );
    }
}

#[test]
fn at_most_one_date_tag() {
    for s in corpus() {
        let r = parse_str(s);
        if r.typ == Type::Magazine {
            continue;
        }
        let count = r
            .tags()
            .iter()
            .filter(|t| t.is(&[TagType::Date]))
            .count();
        assert!(count <= 1, "{s:?} has {count} date tags");
    }
}

#[test]
fn exactly_one_ext_and_group_in_back_segment() {
    for s in corpus() {
        let r = parse_str(s);
        let back = &r.tags()[r.end()..];
        assert!(
            back.iter().filter(|t| t.is(&[TagType::Ext])).count() <= 1,
            "{s:?} has multiple ext tags"
        );
        assert!(
            back.iter().filter(|t| t.is(&[TagType::Group])).count() <= 1,
            "{s:?} has multiple group tags"
        );
    }
}

#[test]
fn velvet_underground_box_set() {
    let r = parse_str(
        "The_Velvet_Underground-The_Complete_Matrix_Tapes-Reissue_Limited_Edition_Boxset-8LP-2019-NOiR",
    );
    assert_eq!(r.typ, Type::Music);
    assert_eq!(r.artist.as_deref(), Some("The Velvet Underground"));
    assert_eq!(r.title.as_deref(), Some("The Complete Matrix Tapes"));
    assert_eq!(r.year, Some(2019));
    assert_eq!(r.disc.as_deref(), Some("8x"));
    assert_eq!(r.source.as_deref(), Some("LP"));
    assert_eq!(r.edition, vec!["Limited.Edition"]);
    assert_eq!(r.other, vec!["REISSUE", "BOXSET"]);
    assert_eq!(r.group.as_deref(), Some("NOiR"));
}

#[test]
fn the_matrix_movie() {
    let r = parse_str("The.Matrix.1999.mkv");
    assert_eq!(r.typ, Type::Movie);
    assert_eq!(r.title.as_deref(), Some("The Matrix"));
    assert_eq!(r.year, Some(1999));
    assert_eq!(r.ext.as_deref(), Some("mkv"));
}

#[test]
fn lower_decks_episode() {
    let r = parse_str(
        "Star.Trek.Lower.Decks.S03E02.The.Least.Dangerous.Game.1080p.AMZN.WEB-DL.DDP.5.1.H.264-GNOME.mkv",
    );
    assert_eq!(r.typ, Type::Episode);
    assert_eq!(r.title.as_deref(), Some("Star Trek Lower Decks"));
    assert_eq!(r.series, Some(3));
    assert_eq!(r.episode, Some(2));
    assert_eq!(r.subtitle.as_deref(), Some("The Least Dangerous Game"));
    assert_eq!(r.resolution.as_deref(), Some("1080p"));
    assert_eq!(r.collection.as_deref(), Some("AMZN"));
    assert_eq!(r.source.as_deref(), Some("WEB-DL"));
    assert_eq!(r.audio, vec!["DDP"]);
    assert_eq!(r.channels.as_deref(), Some("5.1"));
    assert_eq!(r.codec, vec!["H.264"]);
    assert_eq!(r.group.as_deref(), Some("GNOME"));
    assert_eq!(r.ext.as_deref(), Some("mkv"));
}

#[test]
fn pmedia_music() {
    let r = parse_str("[PMEDIA] T-Pain - The Lost Remixes (2020) Mp3 320kbps \u{2b50}");
    assert_eq!(r.typ, Type::Music);
    assert_eq!(r.artist.as_deref(), Some("T-Pain"));
    assert_eq!(r.title.as_deref(), Some("The Lost Remixes"));
    assert_eq!(r.year, Some(2020));
    assert_eq!(r.audio, vec!["MP3"]);
    assert_eq!(r.site.as_deref(), Some("PMEDIA"));
    assert_eq!(r.group, None);
}

#[test]
fn rocky_ii_movie() {
    let r = parse_str("rocky ii.mkv");
    assert_eq!(r.typ, Type::Movie);
    assert_eq!(r.title.as_deref(), Some("rocky ii"));
    assert_eq!(r.ext.as_deref(), Some("mkv"));
    // roman-aware ordering
    let a = parse_str("rocky.mkv");
    let b = parse_str("rocky iii.mkv");
    assert_eq!(compare(&a, &r), std::cmp::Ordering::Less);
    assert_eq!(compare(&r, &b), std::cmp::Ordering::Less);
}

#[test]
fn narnia_book() {
    let r = parse_str(
        "C.S..Lewis~Die.Chroniken.von.Narnia~Der.Koenig.von.Narnia.Bd.3.2013.German.Retail.EPUB.eBook-BitBook",
    );
    assert_eq!(r.typ, Type::Book);
    assert_eq!(r.artist.as_deref(), Some("C.S. Lewis"));
    assert_eq!(r.title.as_deref(), Some("Die Chroniken von Narnia"));
    assert_eq!(r.year, Some(2013));
    assert_eq!(r.language, vec!["GERMAN"]);
    assert!(r.other.iter().any(|o| o == "RETAIL"), "other: {:?}", r.other);
    assert_eq!(r.container.as_deref(), Some("EPUB"));
    assert_eq!(r.group.as_deref(), Some("BitBook"));
}

#[test]
fn trailing_hex_promotes_to_sum_not_group() {
    let r = parse_str("Show.S01E01.720p.x264.a1b2c3d4");
    assert_eq!(r.sum.as_deref(), Some("a1b2c3d4"));
    assert_eq!(r.group, None);
}

#[test]
fn checksum_and_meta_brackets() {
    let r = parse_str("My.Album.2004.FLAC [DEADBEEF]");
    assert_eq!(r.sum.as_deref(), Some("DEADBEEF"));

    let r = parse_str("[REQ] The.Matrix.1999.1080p.x264-GRP");
    assert!(r.req);
    assert_eq!(r.group.as_deref(), Some("GRP"));

    let r = parse_str("{{s3cret}} Some.Thing.2004.mkv");
    assert_eq!(r.pass.as_deref(), Some("s3cret"));

    let r = parse_str("[TGx] Cool.Movie.2020.1080p.WEB.x264-GRP");
    assert_eq!(r.site.as_deref(), Some("TGx"));

    let r = parse_str("[[origin:usenet]] Thing.2019.mkv");
    assert_eq!(r.meta, vec!["origin:usenet"]);
}

#[test]
fn app_release() {
    let r = parse_str("Cool.Tool.v2.4.1.WiN.x64-TiNYiSO");
    assert_eq!(r.typ, Type::App);
    assert_eq!(r.title.as_deref(), Some("Cool Tool"));
    assert_eq!(r.version.as_deref(), Some("v2.4.1"));
    assert_eq!(r.platform.as_deref(), Some("WiN"));
    assert_eq!(r.arch.as_deref(), Some("x64"));
    assert_eq!(r.group.as_deref(), Some("TiNYiSO"));
}

#[test]
fn game_release() {
    let r = parse_str("Cyber.Heist.NSW-VENOM");
    assert_eq!(r.typ, Type::Game);
    assert_eq!(r.platform.as_deref(), Some("NSW"));
    assert_eq!(r.group.as_deref(), Some("VENOM"));

    let r = parse_str("super.smash.brothers.nsw");
    assert_eq!(r.typ, Type::Game);

    let r = parse_str("minesweeper.winnt");
    assert_eq!(r.typ, Type::App);
}

#[test]
fn audiobook_release() {
    let r = parse_str("Stephen.Fry.Mythos.Unabridged.AUDIOBOOK.MP3-GRP");
    assert_eq!(r.typ, Type::Audiobook);
    assert_eq!(r.audio, vec!["MP3"]);
    assert_eq!(r.title.as_deref(), Some("Stephen Fry Mythos Unabridged"));
}

#[test]
fn comic_release() {
    let r = parse_str("Saga.Vol.03.2014.Digital.COMIC.CBZ-GRP");
    assert_eq!(r.typ, Type::Comic);
    assert_eq!(r.container.as_deref(), Some("CBZ"));
}

#[test]
fn comic_cbr_reinterpreted_from_audio() {
    // a lone CBR reads as the comic container, not constant bitrate
    let r = parse_str("Watchmen.Chapter.One.2009.CBR-GRP");
    assert_eq!(r.container.as_deref(), Some("CBR"));
    assert!(r.audio.is_empty());
}

#[test]
fn education_release() {
    let r = parse_str("Learn.Rust.Fast.UDEMY.TUTORIAL-GRP");
    assert_eq!(r.typ, Type::Education);
    assert_eq!(r.collection.as_deref(), Some("UDEMY"));
}

#[test]
fn magazine_month_synthesis() {
    let r = parse_str("Fine.Cooking.June.2020.MAGAZiNE.PDF-SCENE");
    assert_eq!(r.typ, Type::Magazine);
    assert_eq!(r.title.as_deref(), Some("Fine Cooking"));
    assert_eq!(r.year, Some(2020));
    assert_eq!(r.month, Some(6));
    // magazines may keep two date mentions
    let dates = r
        .tags()
        .iter()
        .filter(|t| t.is(&[TagType::Date]))
        .count();
    assert_eq!(dates, 2);
}

#[test]
fn music_id_and_year() {
    let r = parse_str("Faithless - Insomnia (FTLS001) (1995).mp3");
    assert_eq!(r.typ, Type::Music);
    assert_eq!(r.artist.as_deref(), Some("Faithless"));
    assert_eq!(r.title.as_deref(), Some("Insomnia"));
    assert_eq!(r.id.as_deref(), Some("FTLS001"));
    assert_eq!(r.year, Some(1995));
}

#[test]
fn parenthesized_genre() {
    let r = parse_str("Prodigy - Fat of the Land (Electronic) (1997) FLAC");
    assert_eq!(r.typ, Type::Music);
    assert_eq!(r.genre.as_deref(), Some("Electronic"));
    assert_eq!(r.year, Some(1997));
    assert_eq!(r.audio, vec!["FLAC"]);
}

#[test]
fn disc_shapes() {
    let r = parse_str("Artist-Album-2CD-2003-GRP");
    assert_eq!(r.disc.as_deref(), Some("2x"));
    assert_eq!(r.source.as_deref(), Some("CD"));

    let r = parse_str("The.Show.S02.DVD3");
    assert_eq!(r.series, Some(2));
    assert_eq!(r.disc.as_deref(), Some("DVD3"));
    assert_eq!(r.source.as_deref(), Some("DVD"));
}

#[test]
fn disc_source_year_run() {
    let r = parse_str("VLS2004.Artist.Unknown");
    assert_eq!(r.source.as_deref(), Some("Vinyl"));
    assert_eq!(r.year, Some(2004));

    let r = parse_str("WEB2007.Something");
    assert_eq!(r.source.as_deref(), Some("WEB"));
    assert_eq!(r.year, Some(2007));
}

#[test]
fn date_shapes() {
    let r = parse_str("Top.Show.2020-03-04.720p.WEB.x264-GRP");
    assert_eq!(r.typ, Type::Episode);
    assert_eq!((r.year, r.month, r.day), (Some(2020), Some(3), Some(4)));

    let r = parse_str("News.23.04.2021.WEB.x264");
    assert_eq!((r.year, r.month, r.day), (Some(2021), Some(4), Some(23)));

    let r = parse_str("Show.MAY-30-1992.HDTV");
    assert_eq!((r.year, r.month, r.day), (Some(1992), Some(5), Some(30)));

    let r = parse_str("Old.Show.17.12.15.HDTV.x264");
    assert_eq!((r.year, r.month, r.day), (Some(2017), Some(12), Some(15)));
}

#[test]
fn multi_season_run() {
    let r = parse_str("Show.S01S02S03.COMPLETE.1080p.BluRay.x265-BOX");
    assert_eq!(r.typ, Type::Series);
    assert_eq!(r.series, Some(1));
}

#[test]
fn bare_episode_marker() {
    let r = parse_str("Episode 15 - the one with the thing");
    assert_eq!(r.episode, Some(15));
    assert_eq!(r.series, None);
}

#[test]
fn hdr_slots() {
    let r = parse_str("Movie.2022.2160p.WEB-DL.DV.HDR10.H.265-GRP");
    assert_eq!(r.hdr, vec!["DV", "HDR10"]);
    assert_eq!(r.resolution.as_deref(), Some("2160p"));
    assert_eq!(r.codec, vec!["H.265"]);
}

#[test]
fn episode_subtitle_after_marker() {
    let r = parse_str("Some.Show.S01E02.720p.WEB.x264-TEAM");
    assert_eq!(r.typ, Type::Episode);
    assert_eq!(r.title.as_deref(), Some("Some Show"));
    assert_eq!(r.subtitle, None);
    assert_eq!(r.group.as_deref(), Some("TEAM"));
}

/// The canonical order of the published comparator. Shuffled
/// deterministically, sorted, and compared against this fixed order.
fn sort_corpus() -> Vec<&'static str> {
    vec![
        "",
        "1",
        "ii",
        "13",
        "xiii",
        "i",
        "i.am.legend",
        "'twas the night",
        "twas the night",
        "v",
        "v.for.vendetta",
        "X.2022.BluRay.720p.DD.2.0.x264",
        "I'll.Follow.You.Down.2013.BluRay.Remux.1080p.AVC.DTS-HD.MA.5.1-HiFi.mkv",
        "a\tthing.1998.dvdrip",
        "a thing.1999.dvdrip",
        "Amélie.mkv",
        "amelie.1998.mkv",
        "Amélie.1999.mkv",
        "ghostbusters.mkv",
        "ghostbusters.ii.mkv",
        "ghostbusters.afterlife.mkv",
        "Harry.Potter.and.the.Sorcerer's.Stone.2001.Theatrical.Cut.mkv",
        "Harry.Potter.and.the.Chamber.of.Secrets.2002.Theatrical.Cut.mkv",
        "Harry.Potter.and.the.Prisoner.of.Azkaban.2004.mkv",
        "Harry.Potter.&.the.Goblet.of.Fire.2005.mkv",
        "Harry.Potter.and.the.Order.of.the.Phoenix.2007.mkv",
        "Harry.Potter.and.the.Half-Blood.Prince.2009.mkv",
        "Harry.Potter.and.the.Deathly.Hallows.Part.1.2010.mkv",
        "Harry.Potter.and.the.Deathly.Hallows.Part.2.2011.mkv",
        "i.am.legend.mkv",
        "LAWLE$$.mkv",
        "lawless.mkv",
        "rocky.mkv",
        "\trocky ii.mkv",
        "rocky iii.mkv",
        "rocky iv.mkv",
        "rocky v.mkv",
        "ROCKY 6.MKV",
        "\trocky\t6.mkv",
        "rocky 6.mkv",
        "rOCKY VII.mkv",
        "rocky 8.mkv",
        "rocky\tix.mkv\t\t",
        " ROCKY x.mkv ",
        "rocky 11.mkv",
        "the.matrix (part 2).1997.mkv",
        "The.Matrix.1999.mkv",
        "The.Matrix.Reloaded.2003.mkv",
        "The.Matrix.Revolutions.2004.mkv",
        "The.Matrix.Resurrections.2021.mkv",
        "The.Thomas.Crown.Affair.1968.720p.BluRay.AAC.2.0.x264-TDD.mkv",
        "The Thomas Crown Affair 1968 1080p BluRay AVC DTS-HD MA 2.0-CtrlHD",
        "The.Thomas.Crown.Affair.1968.4K.Remaster.720p.BluRay.AAC.2.0.x264-TDD.mkv",
        "The Thomas Crown Affair 1999 BluRay 1080p DTS-HD MA 5.1 AVC REMUX-FraMeSToR",
        "ultra vol. 1.mkv",
        "ultra vol 2.mkv",
        "ultra vol 3.1997.mkv",
        "ultra vol iii.1997.mkv",
        "ultra vol iv.mkv",
        "ultra vol. 8.mkv",
        "ultra vol ix.mkv",
        "ultra. vol. 13.mkv",
        "ultra vol xiii.mkv",
        "v.for.vendetta.mkv",
        "Star.Trek.Lower.Decks.S01E00.Decks.Creator.And.Cast.Talk.Season.1.1080p.CBS.WEB-DL.AAC2.0.x264-TEPES.mkv",
        "Star.Trek.Lower.Decks.S02.1080p.AMZN.WEB-DL.DDP5.1.H.264-NTb",
        "Star.Trek.Lower.Decks.S03E01.Grounded.1080p.AMZN.WEB-DL.DDP5.1.H.264-NTb.mkv",
        "Star.Trek.Lower.Decks.S03E02.The.Least.Dangerous.Game.1080p.AMZN.WEB-DL.DDP.5.1.H.264-GNOME.mkv",
        "Star.Trek.Lower.Decks.S03E03.1080p.WEB.H264-GLHF",
        "Star Trek - Lower Decks    S03E03 Mining the Mind's Mines (1080p AMZN Webrip x265 10bit EAC3 5.1 - Goki)[TAoE].mkv",
        "Star.Trek.Lower.Decks.S03E04.Room.For.Growth.1080p.AMZN.WEB-DL.DDP.5.1.H.264-GNOME.mkv",
        "Star.Trek.Lower.Decks.S03E05.1080p.WEB.h264-KOGi.mkv",
        "Star Trek - Lower Decks (2020) S03E03 Mining the Mind's Mines (1080p AMZN Webrip x265 10bit EAC3 5.1 - Goki)[TAoE].mkv",
        "Zebra.S01E02",
        "Zébra.2009.S00.x264-group.mkv",
        "Zebra.2009.S01.FLAC-group",
        "Zebra.2009.S01E02",
        "Zébra.2009.S02",
        "T-Pain - The Lost Remixes (2020) Mp3 320kbps [PMEDIA] ⭐️",
        "the cc - A 1999.mp3",
        "the cc - a - the remix 1999.mp3",
        "minesweeper.winnt",
        "super.SMASH.brothers.nsw",
        "super.smash.brothers.nsw",
        "C.S. Lewis - Die Chroniken.von.Narnia - Der.Koenig.von.Narnia.Bd.II.2013.German.Retail.EPUB.eBook-BitBook",
        "C.S..Lewis.-.Die.Chroniken.von.Narnia ~ Der.Koenig.von.Narnia.Bd.1.2013.eBook-BitBook",
        "C.S..Lewis~Die.Chroniken.von.Narnia~Der.Koenig.von.Narnia.Bd.3.2013.German.Retail.EPUB.eBook-BitBook",
    ]
}

#[test]
fn sort_order_is_canonical() {
    let exp = sort_corpus();
    assert!(exp.len() >= 80, "corpus too small: {}", exp.len());
    let mut releases: Vec<_> = exp.iter().map(|s| parse_str(s)).collect();
    for (s, r) in exp.iter().zip(&releases) {
        if !s.is_empty() {
            assert!(
                r.title.as_deref().is_some_and(|t| !t.is_empty()),
                "no title for {s:?}"
            );
        }
    }
    // deterministic shuffle
    let mut state: u64 = 0x6b697269;
    for i in (1..releases.len()).rev() {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let j = (state >> 33) as usize % (i + 1);
        releases.swap(i, j);
    }
    releases.sort_by(compare);
    let got: Vec<String> = releases
        .iter()
        .map(|r| String::from_utf8_lossy(&r.original()).into_owned())
        .collect();
    for (i, (g, e)) in got.iter().zip(&exp).enumerate() {
        assert_eq!(g, e, "position {i}");
    }
    assert_eq!(got.len(), exp.len());
}

#[test]
fn custom_registry_groups_classify() {
    // extra group descriptors merged over the embedded registry
    let csv = "Type,Tag,Title,Regexp,Other,ReleaseType,TypeExclusive\n\
               group,MYGAMES,,,,game,\n";
    let extra = kiriwake_core::taginfo::load_str(csv).unwrap();
    let infos = kiriwake_core::taginfo::all(&[extra]).unwrap();
    let p = TagParser::new(infos).unwrap();
    let r = p.parse_release(b"Space.Adventure-MYGAMES");
    assert_eq!(r.typ, Type::Game);
    assert_eq!(r.group.as_deref(), Some("MYGAMES"));
}
