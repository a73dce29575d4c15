//! 站台頁面、DNS 紀錄與地點的資料型別，以及各層之間的 trait

pub mod model;
pub mod ports;
