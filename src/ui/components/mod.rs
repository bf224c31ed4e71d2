pub mod card_list;
pub mod progress_bar;
pub mod quiz_view;
pub mod section_list;
pub mod stats_sidebar;
