use core::str::FromStr;

use jobboard_core::DomainError;

use crate::app::errors::ApiResult;

/// Parse a path or body identifier; failures surface as `InvalidId`.
pub fn parse_id<T>(raw: &str) -> ApiResult<T>
where
    T: FromStr<Err = DomainError>,
{
    Ok(raw.trim().parse::<T>()?)
}
