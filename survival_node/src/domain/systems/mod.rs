// Pure game rules operating on domain records.

pub mod cycle;
pub mod encounter;
pub mod lifecycle;
pub mod spawn;
pub mod survival;
