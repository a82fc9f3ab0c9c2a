//! Table, field, and view names of the Airtable base.

pub mod submission {
    pub const TABLE: &str = "Misc1";
    pub const TEXT: &str = "Name";
    pub const AUTHOR: &str = "Discord Username";
    pub const MESSAGE_ID: &str = "Message ID";
    pub const VIDEO: &str = "Video";
    pub const BOOST_CODE: &str = "Boostkod";
    /// Formula field the base derives from the message text.
    pub const CAMPAIGN_CODE: &str = "Campaign";
}

pub mod campaign {
    pub const TABLE: &str = "Campaigns";
    pub const CODE: &str = "Short C Formular";
    pub const NAME: &str = "Name";
}

pub mod creator {
    pub const TABLE: &str = "Creators Master";
    /// Canonical handle first, then aliases in precedence order.
    pub const HANDLE_FIELDS: [&str; 3] = ["TikTok Username", "TikTok Username 2", "TikTok Username 3"];
}

pub mod kpi {
    pub const WEEKLY_TABLE: &str = "KPIs Weekly";
    pub const MONTHLY_TABLE: &str = "KPIs Monthly";
    pub const CURRENT_WEEK: &str = "Current Week?";
    pub const CURRENT_MONTH: &str = "Current Month?";
    pub const YES: &str = "Yes";
}

pub mod tracked {
    pub const TABLE: &str = "Parasition Group Discord";
    /// View holding the rows of the current tracking window.
    pub const CURRENT_VIEW: &str = "Current Month";
    pub const CREATOR: &str = "Creator";
    pub const SUBMITTER: &str = "Creator Social Name";
    pub const CAMPAIGN: &str = "Campaign";
    pub const VIDEO: &str = "Video";
    pub const BOOST_CODE: &str = "Boostkod";
    pub const MESSAGE_ID: &str = "Message ID";
    pub const VIEWS: &str = "Views Count";
    pub const LIKES: &str = "Likes Count";
    pub const COMMENTS: &str = "Comments Count";
    pub const BOOKMARKS: &str = "Bookmarks Count";
    pub const CREATOR_LINK: &str = "Creators Master";
    pub const CAMPAIGN_LINK: &str = "Campaign Name";
    pub const WEEKLY_KPI_LINK: &str = "KPIs Weekly";
    pub const MONTHLY_KPI_LINK: &str = "KPIs Monthly";
}
