use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DayRecord {
    #[serde(default)]
    pub tabs: u64,
    #[serde(default)]
    pub windows: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: i64,
    pub tab_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CurrentCounts {
    pub tab_count: u64,
    pub window_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: u64,
    #[serde(default)]
    pub tabs: Vec<TabInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TabEvent {
    TabCreated { window_id: u64, tab_id: u64 },
    TabRemoved {
        #[serde(default)]
        window_id: Option<u64>,
        tab_id: u64,
    },
    WindowCreated { window_id: u64 },
    WindowRemoved { window_id: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Range {
    #[default]
    Today,
    Week,
    Month,
    Year,
    AllTime,
}

impl Range {
    pub fn parse(value: &str) -> Self {
        match value {
            "today" => Self::Today,
            "week" => Self::Week,
            "month" => Self::Month,
            "year" => Self::Year,
            "allTime" => Self::AllTime,
            _ => Self::Today,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    GetData,
    GetTabData {
        #[serde(default)]
        range: Option<String>,
    },
    ResetTotalTabs {
        #[serde(default)]
        confirm: bool,
    },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response {
    Data(DataResponse),
    TabData(TabDataResponse),
    Reset(ResetResponse),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataResponse {
    pub tab_count: u64,
    pub window_count: u64,
    pub result: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct TabDataResponse {
    pub data: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub total_tabs: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub tab_count: u64,
    pub window_count: u64,
    pub total_tabs: u64,
    pub badge: String,
}

#[derive(Debug, Serialize)]
pub struct BadgeResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct DailyPoint {
    pub date: String,
    pub label: String,
    pub tabs: u64,
    pub windows: u64,
}

#[derive(Debug, Serialize)]
pub struct DailySeriesResponse {
    pub days: Vec<DailyPoint>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub keys: usize,
}

#[derive(Debug, Deserialize, Default)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct StartupRequest {
    #[serde(default)]
    pub windows: Option<Vec<WindowInfo>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TabDataParams {
    #[serde(default)]
    pub range: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DailyParams {
    #[serde(default)]
    pub days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub show_tabs_number: bool,
    pub step_enabled: bool,
    pub auto_scale: bool,
    pub num_of_days: u32,
    #[serde(rename = "useGBDateFormat")]
    pub use_gb_date_format: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_tabs_number: true,
            step_enabled: false,
            auto_scale: false,
            num_of_days: 7,
            use_gb_date_format: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub show_tabs_number: Option<bool>,
    pub step_enabled: Option<bool>,
    pub auto_scale: Option<bool>,
    pub num_of_days: Option<u32>,
    #[serde(rename = "useGBDateFormat")]
    pub use_gb_date_format: Option<bool>,
}
