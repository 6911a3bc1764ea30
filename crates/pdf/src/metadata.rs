//! Document info stamping for rewritten files.

use chrono::Local;
use lopdf::{Dictionary, Document, Object, StringFormat};

const PRODUCER: &str = concat!("boilerstrip v", env!("CARGO_PKG_VERSION"));

/// PDF date string (`D:YYYYMMDDHHmmSS`) for the current local time.
pub(crate) fn pdf_date_now() -> String {
    format!("D:{}", Local::now().format("%Y%m%d%H%M%S"))
}

/// Sets `Producer` and `ModDate` in the Info dictionary, creating the
/// dictionary if the document has none.
pub(crate) fn stamp_metadata(doc: &mut Document) {
    let info_id = match doc.trailer.get(b"Info").and_then(Object::as_reference) {
        Ok(id) => id,
        Err(_) => {
            let id = doc.add_object(Object::Dictionary(Dictionary::new()));
            doc.trailer.set("Info", Object::Reference(id));
            id
        }
    };

    let date = pdf_date_now();
    if let Ok(Object::Dictionary(ref mut info)) = doc.get_object_mut(info_id) {
        info.set(
            "Producer",
            Object::String(PRODUCER.as_bytes().to_vec(), StringFormat::Literal),
        );
        info.set(
            "ModDate",
            Object::String(date.as_bytes().to_vec(), StringFormat::Literal),
        );
    } else {
        log::warn!("[Transform] Info entry is not a dictionary, metadata not stamped");
        return;
    }

    log::debug!("[Transform] stamped Producer={}, ModDate={}", PRODUCER, date);
}
