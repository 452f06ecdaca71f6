use crate::alignment::{ReferenceDictionary, ReferenceSequence};
use crate::types::{HashSet, HashSetExt};
use noodles::sam;
use sam::header::record::value::map::header::tag::SORT_ORDER;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Unknown,
    Unsorted,
    QueryName,
    Coordinate,
}

impl SortOrder {
    pub fn from_bytes(value: &[u8]) -> Self {
        match value {
            b"coordinate" => SortOrder::Coordinate,
            b"queryname" => SortOrder::QueryName,
            b"unsorted" => SortOrder::Unsorted,
            _ => SortOrder::Unknown,
        }
    }
}

/// What validation needs from a SAM header.
#[derive(Debug, Clone, Default)]
pub struct AlignmentHeader {
    pub dictionary: ReferenceDictionary,
    pub sort_order: SortOrder,
    pub read_groups: HashSet<String>,
}

impl AlignmentHeader {
    pub fn new(dictionary: ReferenceDictionary) -> Self {
        Self {
            dictionary,
            sort_order: SortOrder::Unknown,
            read_groups: HashSet::new(),
        }
    }

    pub fn from_sam_header(header: &sam::Header) -> Self {
        let dictionary = ReferenceDictionary::new(
            header
                .reference_sequences()
                .iter()
                .map(|(name, rs)| ReferenceSequence {
                    name: name.to_string(),
                    length: rs.length().get(),
                })
                .collect(),
        );
        let sort_order = header
            .header()
            .and_then(|hd| hd.other_fields().get(&SORT_ORDER))
            .map(|so| SortOrder::from_bytes(so.as_slice()))
            .unwrap_or_default();
        let read_groups = header.read_groups().keys().map(|id| id.to_string()).collect();

        Self {
            dictionary,
            sort_order,
            read_groups,
        }
    }
}
