pub mod force_graph;
pub mod history_panel;
pub mod notices;
pub mod search_form;
