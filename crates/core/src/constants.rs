/// Default asset universe, a mix of ASX and global ETFs plus large caps.
pub const DEFAULT_UNIVERSE: [&str; 7] = ["VAS", "VGS", "IVV", "BHP", "CSL", "CBA", "NDQ"];

/// Default investor age used for a fresh profile
pub const DEFAULT_AGE: u32 = 30;

/// Upper bound accepted for the investor age
pub const MAX_AGE: u32 = 120;

/// Backend host used by release builds
pub const PRODUCTION_API_URL: &str = "https://aifinance-backendbackend.onrender.com";

/// Backend host used by debug builds
pub const LOCAL_API_URL: &str = "http://localhost:5001";

/// Column holding the ticker in a brokerage holdings export
pub const EXPORT_SECURITY_COLUMN: &str = "Security";

/// Column holding the unit count in a brokerage holdings export
pub const EXPORT_UNITS_COLUMN: &str = "Units";
