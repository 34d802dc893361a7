//! Integration tests for decoding lines into a DiscInfo tree
//!
//! Covers index bounds, duplicate rejection, placeholder growth and the
//! drive → disc → count → title → stream scenario.

use artie_common::makemkv::{
    decode, Attribute, AttributeKind, DiscInfoAggregator, Entity, InfoError, MAX_STREAM_COUNT,
    MAX_TITLE_COUNT,
};

fn name(value: &str) -> Attribute {
    Attribute::new(AttributeKind::Name, value)
}

#[test]
fn test_end_to_end_scenario() {
    let lines = [
        r#"DRV:0,2,0,0,"Drive","","/dev/sr0""#,
        r#"CINFO:2,0,"Movie""#,
        "TCOUNT:2",
        r#"TINFO:1,27,0,"movie_t01.mkv""#,
        r#"SINFO:1,0,7,0,"AC3""#,
    ];

    let mut agg = DiscInfoAggregator::new();
    for line in lines {
        let message = decode(line).expect("line should decode");
        agg.apply(&message).expect("message should apply");
    }

    let disc = agg.into_disc_info();
    assert_eq!(disc.attribute(AttributeKind::Name), Some("Movie"));
    assert_eq!(disc.title_count, 2);
    assert_eq!(disc.titles.len(), 2);

    let title0 = disc.title(0).unwrap();
    assert!(title0.attributes.is_empty());
    assert!(title0.streams.is_empty());

    let title1 = disc.title(1).unwrap();
    assert_eq!(title1.attribute(AttributeKind::OutputFileName), Some("movie_t01.mkv"));
    assert_eq!(title1.streams.len(), 1);
    assert_eq!(
        title1.stream(0).unwrap().attribute(AttributeKind::CodecLong),
        Some("AC3")
    );
}

#[test]
fn test_title_index_bounds_do_not_mutate() {
    let mut agg = DiscInfoAggregator::new();

    for index in [-1, -100, i32::MIN] {
        assert_eq!(
            agg.add_title_attribute(index, name("x")),
            Err(InfoError::InvalidIndex {
                entity: Entity::Title,
                index,
            })
        );
    }

    for index in [MAX_TITLE_COUNT as i32, MAX_TITLE_COUNT as i32 + 1, i32::MAX] {
        assert_eq!(
            agg.add_title_attribute(index, name("x")),
            Err(InfoError::IndexOutOfRange {
                entity: Entity::Title,
                index,
                limit: MAX_TITLE_COUNT,
            })
        );
    }

    assert!(agg.disc_info().titles.is_empty());

    // Last valid index is accepted
    agg.add_title_attribute(MAX_TITLE_COUNT as i32 - 1, name("last"))
        .unwrap();
    assert_eq!(agg.disc_info().titles.len(), MAX_TITLE_COUNT);
}

#[test]
fn test_stream_index_bounds_do_not_mutate() {
    let mut agg = DiscInfoAggregator::new();

    assert!(matches!(
        agg.add_stream_attribute(-1, 0, name("x")),
        Err(InfoError::InvalidIndex { entity: Entity::Title, .. })
    ));
    assert!(matches!(
        agg.add_stream_attribute(MAX_TITLE_COUNT as i32, 0, name("x")),
        Err(InfoError::IndexOutOfRange { entity: Entity::Title, .. })
    ));
    assert!(matches!(
        agg.add_stream_attribute(3, -1, name("x")),
        Err(InfoError::InvalidIndex { entity: Entity::Stream, .. })
    ));
    assert!(matches!(
        agg.add_stream_attribute(3, MAX_STREAM_COUNT as i32, name("x")),
        Err(InfoError::IndexOutOfRange { entity: Entity::Stream, .. })
    ));

    assert!(agg.disc_info().titles.is_empty());

    agg.add_stream_attribute(0, MAX_STREAM_COUNT as i32 - 1, name("last"))
        .unwrap();
    assert_eq!(agg.disc_info().titles[0].streams.len(), MAX_STREAM_COUNT);
}

#[test]
fn test_duplicate_title_attribute_keeps_first_value() {
    let mut agg = DiscInfoAggregator::new();
    agg.add_title_attribute(2, name("First")).unwrap();

    // Same value is still a duplicate
    assert_eq!(
        agg.add_title_attribute(2, name("First")),
        Err(InfoError::DuplicateAttribute {
            entity: Entity::Title,
            kind: AttributeKind::Name,
        })
    );
    assert!(agg.add_title_attribute(2, name("Second")).is_err());

    assert_eq!(
        agg.disc_info().title(2).unwrap().attribute(AttributeKind::Name),
        Some("First")
    );

    // Same kind on another title is fine
    agg.add_title_attribute(1, name("Other")).unwrap();
}

#[test]
fn test_duplicate_disc_and_stream_attributes() {
    let mut agg = DiscInfoAggregator::new();
    agg.add_disc_attribute(name("Disc")).unwrap();
    assert!(matches!(
        agg.add_disc_attribute(name("Disc")),
        Err(InfoError::DuplicateAttribute { entity: Entity::Disc, .. })
    ));

    agg.add_stream_attribute(0, 0, name("Stream")).unwrap();
    assert!(matches!(
        agg.add_stream_attribute(0, 0, name("Changed")),
        Err(InfoError::DuplicateAttribute { entity: Entity::Stream, .. })
    ));
    assert_eq!(
        agg.disc_info().titles[0].streams[0].attribute(AttributeKind::Name),
        Some("Stream")
    );

    // Title-level and stream-level maps are independent
    agg.add_title_attribute(0, name("Title")).unwrap();
}

#[test]
fn test_out_of_order_indices_fill_placeholders() {
    let mut agg = DiscInfoAggregator::new();
    agg.add_stream_attribute(5, 2, name("late")).unwrap();
    agg.add_title_attribute(0, name("early")).unwrap();
    agg.add_stream_attribute(5, 0, name("first stream")).unwrap();

    let disc = agg.disc_info();
    assert_eq!(disc.titles.len(), 6);
    for title in &disc.titles[1..5] {
        assert!(title.is_empty());
    }
    let title5 = &disc.titles[5];
    assert_eq!(title5.streams.len(), 3);
    assert!(title5.streams[1].is_empty());
    assert_eq!(title5.streams[0].attribute(AttributeKind::Name), Some("first stream"));
}

#[test]
fn test_title_count_overwrites_and_is_informational() {
    let mut agg = DiscInfoAggregator::new();
    agg.set_title_count(53);
    agg.set_title_count(2);
    agg.add_title_attribute(7, name("x")).unwrap();

    assert_eq!(agg.disc_info().title_count, 2);
    assert_eq!(agg.disc_info().titles.len(), 8);
}

#[test]
fn test_disc_info_json_shape() {
    let mut agg = DiscInfoAggregator::new();
    agg.apply(&decode(r#"CINFO:2,0,"Movie""#).unwrap()).unwrap();
    agg.apply(&decode(r#"SINFO:0,1,7,0,"AC3""#).unwrap()).unwrap();

    let json = serde_json::to_value(agg.disc_info()).unwrap();
    assert_eq!(json["attributes"]["NAME"], "Movie");
    assert_eq!(json["titles"][0]["streams"][1]["attributes"]["CODEC_LONG"], "AC3");
    assert!(json["titles"][0]["streams"][0]["attributes"]
        .as_object()
        .unwrap()
        .is_empty());
}
