//! Utility functions that locate and prepare the application's folders

pub mod state;
