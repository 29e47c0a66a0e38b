//! Request, resource and return commands.
//!
//! # Usage
//!
//! ```bash
//! ml-cli request POST /returns --json '{"orderId":"o1","reason":"damaged"}'
//! ml-cli request GET /shop/orders --role shop -H 'X-Trace: 1'
//! ml-cli fetch my-returns
//! ml-cli fetch shop-returns --shop-id 64f0c2
//! ml-cli return status r1 approved
//! ```

use clap::Subcommand;
use marketlink_client::RequestDescriptor;
use marketlink_core::{ClearScope, Role};
use serde_json::{Value, json};

use super::{CliError, Context, print_json};

/// Catalogued resources.
#[derive(Subcommand)]
pub enum Resource {
    /// Returns requested by the signed-in user
    MyReturns,
    /// Returns filed against a shop
    ShopReturns {
        /// Shop id (defaults to the stored shop session)
        #[arg(long)]
        shop_id: Option<String>,
    },
    /// Orders placed by the signed-in user
    MyOrders,
    /// Referral tree of the signed-in user
    ReferralTree,
    /// Commissions earned by the signed-in user
    Commissions,
    /// Notifications for the active role
    Notifications,
}

/// Return management.
#[derive(Subcommand)]
pub enum ReturnAction {
    /// Request a return
    Create {
        /// Order the return is for
        #[arg(long)]
        order_id: Option<String>,

        /// Return payload as JSON
        #[arg(long)]
        json: String,
    },
    /// Move a return to a new status (as the shop)
    Status {
        /// Return id
        return_id: String,

        /// New status
        status: String,
    },
}

/// Flags for a raw request.
pub struct RequestOptions {
    pub json: Option<String>,
    pub headers: Vec<String>,
    pub role: Option<Role>,
    pub no_auth: bool,
    pub clear_all: bool,
}

/// Send one request and print the response envelope.
pub async fn request(
    ctx: &Context,
    method: &str,
    path: &str,
    options: RequestOptions,
) -> Result<(), CliError> {
    let method = method
        .to_ascii_uppercase()
        .parse()
        .map_err(|_| CliError::InvalidMethod(method.to_string()))?;

    let mut descriptor = RequestDescriptor::new(method, path)
        .requires_auth(!options.no_auth)
        .headers(parse_headers(&options.headers)?);

    if let Some(body) = options.json {
        descriptor = descriptor.json(serde_json::from_str(&body)?);
    }
    if let Some(role) = options.role {
        descriptor = descriptor.as_role(role);
    }
    if options.clear_all {
        descriptor = descriptor.clear_scope(ClearScope::AllRoles);
    }

    let envelope = ctx.client.execute(&descriptor).await?;
    print_json(&serde_json::to_value(envelope)?)
}

/// Resolve a catalogued resource and print it.
pub async fn fetch(ctx: &Context, resource: Resource) -> Result<(), CliError> {
    let client = &ctx.client;

    let value = match resource {
        Resource::MyReturns => Value::Array(client.my_returns().await?),
        Resource::ShopReturns { shop_id } => {
            Value::Array(client.shop_returns(shop_id.as_deref()).await?)
        }
        Resource::MyOrders => Value::Array(client.my_orders().await?),
        Resource::ReferralTree => client.referral_tree().await?,
        Resource::Commissions => Value::Array(client.my_commissions().await?),
        Resource::Notifications => Value::Array(client.notifications().await?),
    };

    print_json(&value)
}

/// Create a return or update its status.
pub async fn returns(ctx: &Context, action: ReturnAction) -> Result<(), CliError> {
    let record = match action {
        ReturnAction::Create { order_id, json } => {
            let body: Value = serde_json::from_str(&json)?;
            ctx.client.create_return(order_id.as_deref(), &body).await?
        }
        ReturnAction::Status { return_id, status } => {
            ctx.client.update_return_status(&return_id, &status).await?
        }
    };

    print_json(&json!({ "return": record }))
}

/// Parse `Name: value` header arguments.
fn parse_headers(raw: &[String]) -> Result<Vec<(String, String)>, CliError> {
    raw.iter()
        .map(|header| {
            header
                .split_once(':')
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                .filter(|(name, _)| !name.is_empty())
                .ok_or_else(|| CliError::InvalidHeader(header.clone()))
        })
        .collect()
}
