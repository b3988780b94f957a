//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into the engine. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every ledger and gateway operation is therefore async, and must
//! be awaited rather than blocked on.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use recharge_engine::{
    payment::PaymentMethod,
    payment_objects::{CallbackPayload, PaymentResult},
    traits::LedgerStore,
    AccountApi,
    OrderFlowApi,
    PaymentApi,
    RechargeApi,
};

use crate::{
    data_objects::{AccountQuery, DescriptorRequest, OrderQuery, PayRequest, PlaceOrderRequest},
    errors::ServerError,
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

//----------------------------------------------   Accounts  ----------------------------------------------------
route!(register => Post "/register" impl LedgerStore);
/// Route handler for `POST /api/register`
///
/// Makes sure the account in the body exists. New accounts start with a zero balance. Registering an existing account
/// returns it unchanged.
pub async fn register<B: LedgerStore>(
    body: web::Json<AccountQuery>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AccountQuery { account } = body.into_inner();
    debug!("💻️ POST register for {account}");
    let account = api.register_account(&account).await?;
    Ok(HttpResponse::Ok().json(account))
}

route!(check_balance => Get "/check_balance" impl LedgerStore);
/// Route handler for `GET /api/check_balance?account={account}`
pub async fn check_balance<B: LedgerStore>(
    query: web::Query<AccountQuery>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let account = query.into_inner().account;
    trace!("💻️ GET check_balance for {account}");
    let balance = api.check_balance(&account).await?;
    Ok(HttpResponse::Ok().json(balance))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(place_order => Post "/place_order" impl LedgerStore);
/// Route handler for `POST /api/place_order`
///
/// Creates a new `pending` order. The response is the stored order, including its new id.
pub async fn place_order<B: LedgerStore>(
    body: web::Json<PlaceOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST place_order for {} from {}", request.amount, request.account);
    let order = match request.recipient {
        Some(recipient) => api.create_order_for(&request.account, &recipient, request.amount).await,
        None => api.create_order(&request.account, request.amount).await,
    }
    .map_err(|e| {
        debug!("💻️ Could not place order. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_status => Get "/order_status" impl LedgerStore);
/// Route handler for `GET /api/order_status?order_id={order_id}`
pub async fn order_status<B: LedgerStore>(
    query: web::Query<OrderQuery>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = query.into_inner().order_id;
    trace!("💻️ GET order_status for [{order_id}]");
    let status = api.check_order_status(&order_id).await?;
    Ok(HttpResponse::Ok().json(status))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(pay => Post "/pay" impl LedgerStore);
/// Route handler for `POST /api/pay`
///
/// A successful payment, or a QR code to complete it with, is returned with `200 OK`. A declined payment is returned
/// with `400 Bad Request`, along with the declined outcome and the order as it now stands.
pub async fn pay<B: LedgerStore>(
    body: web::Json<PayRequest>,
    api: web::Data<PaymentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let PayRequest { order_id, method, params } = body.into_inner();
    debug!("💻️ POST pay for order [{order_id}] with {method}");
    let method = method.parse::<PaymentMethod>()?;
    let result = api.process_payment(&order_id, method, params).await?;
    match result {
        PaymentResult::Declined { .. } => Ok(HttpResponse::BadRequest().json(result)),
        _ => Ok(HttpResponse::Ok().json(result)),
    }
}

route!(payment_callback => Post "/payment_callback" impl LedgerStore);
/// Route handler for `POST /api/payment_callback`
///
/// Called by the payment gateway to confirm a payment. The body is a [`CallbackPayload`]. Repeat deliveries for an
/// order that has already been recharged succeed without changing anything.
pub async fn payment_callback<B: LedgerStore>(
    body: web::Json<CallbackPayload>,
    api: web::Data<RechargeApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payload = body.into_inner();
    info!("💻️ POST payment_callback for order [{}]", payload.order_id);
    let result = api.handle_callback(payload).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(payment_descriptor => Post "/payment_descriptor" impl LedgerStore);
/// Route handler for `POST /api/payment_descriptor`
///
/// Returns the payment link and QR code for an order. The amount must match the order.
pub async fn payment_descriptor<B: LedgerStore>(
    body: web::Json<DescriptorRequest>,
    api: web::Data<PaymentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let DescriptorRequest { order_id, amount } = body.into_inner();
    debug!("💻️ POST payment_descriptor for order [{order_id}]");
    let descriptor = api.generate_payment_descriptor(&order_id, amount).await?;
    Ok(HttpResponse::Ok().json(descriptor))
}

route!(payment_status => Get "/payment_status" impl LedgerStore);
/// Route handler for `GET /api/payment_status?order_id={order_id}`
pub async fn payment_status<B: LedgerStore>(
    query: web::Query<OrderQuery>,
    api: web::Data<PaymentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = query.into_inner().order_id;
    trace!("💻️ GET payment_status for [{order_id}]");
    let report = api.check_payment_status(&order_id).await?;
    Ok(HttpResponse::Ok().json(report))
}
