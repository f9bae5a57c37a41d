//! Known tag vocabularies: INDX entry tags and EXTH record types.

use super::models::ExthValueKind;

/// Human-readable name of an INDX entry tag, as written by kindlegen.
pub fn index_tag_name(tag: u8) -> Option<&'static str> {
    let name = match tag {
        1 => "position",
        2 => "length",
        3 => "label_offset",
        4 => "depth",
        5 => "class_offset",
        6 => "position_fid",
        21 => "parent",
        22 => "first_child",
        23 => "last_child",
        69 => "image_index",
        70 => "description_offset",
        71 => "author_offset",
        72 => "caption_offset",
        73 => "attribution_offset",
        _ => return None,
    };
    Some(name)
}

/// Name and value kind of an EXTH record type.
pub fn exth_tag_info(record_type: u32) -> Option<(&'static str, ExthValueKind)> {
    use ExthValueKind::*;

    let info = match record_type {
        1 => ("drm_server_id", Text),
        2 => ("drm_commerce_id", Text),
        3 => ("drm_ebookbase_book_id", Text),
        100 => ("author", Text),
        101 => ("publisher", Text),
        102 => ("imprint", Text),
        103 => ("description", Text),
        104 => ("isbn", Text),
        105 => ("subject", Text),
        106 => ("published", Text),
        107 => ("review", Text),
        108 => ("contributor", Text),
        109 => ("rights", Text),
        110 => ("subject_code", Text),
        111 => ("type", Text),
        112 => ("source", Text),
        113 => ("asin", Text),
        114 => ("version", Numeric),
        115 => ("sample", Numeric),
        116 => ("start_reading", Numeric),
        117 => ("adult", Text),
        118 => ("price", Text),
        119 => ("currency", Text),
        121 => ("kf8_boundary", Numeric),
        125 => ("resource_count", Numeric),
        129 => ("kf8_cover_uri", Text),
        131 => ("unknown_131", Numeric),
        200 => ("dictionary_short_name", Text),
        201 => ("cover_offset", Numeric),
        202 => ("thumb_offset", Numeric),
        203 => ("has_fake_cover", Numeric),
        204 => ("creator_software", Numeric),
        205 => ("creator_major", Numeric),
        206 => ("creator_minor", Numeric),
        207 => ("creator_build", Numeric),
        208 => ("watermark", Binary),
        209 => ("tamper_keys", Binary),
        300 => ("font_signature", Binary),
        401 => ("clipping_limit", Numeric),
        402 => ("publisher_limit", Numeric),
        404 => ("tts_disable", Numeric),
        405 => ("rental", Numeric),
        406 => ("rental_expiration", Binary),
        501 => ("cde_type", Text),
        502 => ("last_update", Text),
        503 => ("updated_title", Text),
        504 => ("asin_copy", Text),
        524 => ("language", Text),
        525 => ("alignment", Text),
        535 => ("creator_build_tag", Text),
        _ => return None,
    };
    Some(info)
}
