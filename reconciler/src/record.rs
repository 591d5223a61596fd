use serde::Serialize;

pub const PASS: &str = "PASS";
pub const FAIL: &str = "FAIL";

/// `testItem` of the closing verdict record.
pub const SUMMARY_ITEM: &str = "Summary";

/// One entry of the viewer's result list.
///
/// Three shapes share this type: subtest records (`test_name` set), block
/// records (`has_subtests` set) and the final summary record (neither).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    /// Owning marker name, or `Summary`.
    pub test_item: String,
    /// Table row name, subtest records only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_name: Option<String>,
    pub status: String,
    pub absolute_line_number: usize,
    pub absolute_end_line_number: Option<usize>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_subtests: Option<bool>,
}

impl ResultRecord {
    pub fn is_block(&self) -> bool {
        self.has_subtests.is_some()
    }

    pub fn is_summary(&self) -> bool {
        self.test_item == SUMMARY_ITEM && self.test_name.is_none() && self.has_subtests.is_none()
    }

    pub fn failed(&self) -> bool {
        self.status == FAIL
    }
}
