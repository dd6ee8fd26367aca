use lbm_util_error::WhateverResult;
use lbmd::Lbmd;

#[tokio::main]
#[snafu::report]
async fn main() -> WhateverResult<()> {
    Lbmd::builder().run().await?;
    Ok(())
}
