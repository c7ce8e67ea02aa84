//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the database or the payment provider,
//! so they are all `async`.
use std::str::FromStr;

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use order_engine::{
    db_types::{OrderId, ProductId},
    order_objects::CheckoutRequest,
    traits::{InventoryManagement, OrderManagement, PaymentGatewayDatabase, PaymentProvider},
    CheckoutApi,
    InventoryApi,
    OrderFlowError,
    OrdersApi,
    ReconciliationApi,
};

use crate::{
    config::ProxyConfig,
    data_objects::{VerifySessionRequest, WebhookResponse},
    errors::ServerError,
    helpers::get_remote_ip,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout" impl PaymentGatewayDatabase, PaymentProvider);
/// Creates a `pending` order from the cart and a payment session for it.
///
/// Responds with the session id, the URL to send the customer to, and the new order. If the payment provider cannot
/// be reached, the response is a 502 and the order is left `pending` without a session.
pub async fn checkout<B, P>(
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    P: PaymentProvider,
{
    let request = body.into_inner();
    debug!("💻️ POST checkout with {} items", request.items.len());
    let result = api.checkout(request).await.map_err(|e| {
        debug!("💻️ Checkout failed. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(orders => Get "/orders" impl OrderManagement);
/// All orders with their line items, newest first.
pub async fn orders<B: OrderManagement>(api: web::Data<OrdersApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders");
    let orders = api.orders().await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderManagement);
pub async fn order_by_id<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let raw = path.into_inner();
    debug!("💻️ GET order_by_id({raw})");
    let order_id = OrderId::from_str(&raw).map_err(|e| ServerError::InvalidRequestPath(e.to_string()))?;
    let order = api.order_by_id(order_id).await?.ok_or_else(|| {
        ServerError::NoRecordFound(format!("Order {order_id} does not exist"))
    })?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_by_session => Get "/orders/session/{session_id}" impl OrderManagement);
pub async fn order_by_session<B: OrderManagement>(
    path: web::Path<String>,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let session_id = path.into_inner();
    debug!("💻️ GET order_by_session({session_id})");
    let order = api
        .order_by_session(&session_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No order for payment session {session_id}")))?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Inventory  ----------------------------------------------------
route!(stock => Get "/inventory/{product_id}" impl InventoryManagement);
pub async fn stock<B: InventoryManagement>(
    path: web::Path<i64>,
    api: web::Data<InventoryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = ProductId(path.into_inner());
    debug!("💻️ GET stock({product_id})");
    let record = api
        .stock_for(product_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Product {product_id} is not in the inventory")))?;
    Ok(HttpResponse::Ok().json(record))
}

//----------------------------------------------   Reconciliation  ----------------------------------------------
route!(verify_session => Post "/verify-session" impl PaymentGatewayDatabase, PaymentProvider);
/// The pull path. The customer's browser lands on the success page and asks us to check on its payment session.
///
/// `confirmed` is false (with a 200) while the payment has not settled.
pub async fn verify_session<B, P>(
    body: web::Json<VerifySessionRequest>,
    api: web::Data<ReconciliationApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    P: PaymentProvider,
{
    let session_id = body.into_inner().session_id;
    debug!("💻️ POST verify_session({session_id})");
    let result = api.verify_session(&session_id).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(payment_webhook => Post "/webhook" impl PaymentGatewayDatabase, PaymentProvider);
/// The push path. The body is taken raw, since the signature covers the exact bytes that were sent.
///
/// The provider retries anything that is not a 2xx, so:
/// * a bad signature is a 400 (and a security event),
/// * a backend failure is a 500, so that the delivery is retried,
/// * everything else is a 200. Problems with the order itself (e.g. not enough stock) are reported in the body,
///   since retrying would not help.
pub async fn payment_webhook<B, P>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<ReconciliationApi<B, P>>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    P: PaymentProvider,
{
    trace!("💻️ Received payment webhook ({} bytes)", body.len());
    let signature = req.headers().get(api.signature_header()).and_then(|v| v.to_str().ok()).unwrap_or_default();
    match api.handle_push(&body, signature).await {
        Ok(outcome) => {
            debug!("💻️ Payment webhook handled: {outcome:?}");
            Ok(HttpResponse::Ok().json(WebhookResponse::handled(outcome)))
        },
        Err(OrderFlowError::Signature(e)) => {
            let ip = get_remote_ip(&req, proxy.use_x_forwarded_for, proxy.use_forwarded);
            let ip = ip.map(|ip| ip.to_string()).unwrap_or_else(|| "unknown address".into());
            warn!("🚨️ Payment webhook from {ip} failed signature verification. {e}");
            Err(ServerError::InvalidSignature(e))
        },
        Err(OrderFlowError::Database(e)) => {
            error!("💻️ Backend failure while handling a payment webhook. The provider will retry. {e}");
            Err(ServerError::BackendError(e))
        },
        Err(e) => {
            warn!("💻️ Payment webhook acknowledged, but not applied. {e}");
            Ok(HttpResponse::Ok().json(WebhookResponse::refused(e)))
        },
    }
}
