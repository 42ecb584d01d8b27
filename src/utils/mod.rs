// Utility functions
// Helper functions for common operations

pub mod identity_index;
pub mod ordered_view;
pub mod time;
