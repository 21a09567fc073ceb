use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Optica API",
        version = "1.0.0",
        description = r#"
# Optica Back-Office API

Orders, customer records and payments for an optical shop.

## Features

- **Orders**: one order per customer visit, with identity, contact, referring
  institution and a far / near / intermediate prescription
- **Products**: a frame, a glass type and a lens sold at a price
- **Catalog**: frames, glass types and lenses shared across products
- **Vouchers**: payment arrangements covering several orders, settled in
  installments; the balance is always computed from current data
- **Tunnel**: one submission that opens an order with every record attached

## Error Handling

Errors share one body; validation failures carry `field_errors` keyed by
field path:

```json
{
  "error": "Bad Request",
  "message": "Validation failed",
  "field_errors": { "prescription.far.od.axis": ["Ensure this value is between 0 and 180"] },
  "request_id": "4f1c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

## Pagination

List endpoints take `page` (default 1) and `limit` (default 20, max 100).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Public", description = "Front-desk forms"),
        (name = "Users", description = "Back-office accounts"),
        (name = "Orders", description = "Order management endpoints"),
        (name = "Order details", description = "Identity, contact, institution and prescription of an order"),
        (name = "Products", description = "Products sold within an order"),
        (name = "Catalog", description = "Frames, glass types and lenses"),
        (name = "Vouchers", description = "Payments covering orders")
    ),
    paths(
        // Public
        crate::handlers::public::home,
        crate::handlers::public::create_identity,
        crate::handlers::public::submit_tunnel,

        // Users
        crate::handlers::users::create_user,
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,

        // Orders
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::latest_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::order_summary,
        crate::handlers::orders::order_total_price,
        crate::handlers::orders::change_owner,
        crate::handlers::orders::delete_order,

        // Order details
        crate::handlers::order_details::get_identity,
        crate::handlers::order_details::put_identity,
        crate::handlers::order_details::delete_identity,
        crate::handlers::order_details::list_identities,
        crate::handlers::order_details::get_contact,
        crate::handlers::order_details::put_contact,
        crate::handlers::order_details::delete_contact,
        crate::handlers::order_details::list_contacts,
        crate::handlers::order_details::get_institution,
        crate::handlers::order_details::put_institution,
        crate::handlers::order_details::delete_institution,
        crate::handlers::order_details::list_institutions,
        crate::handlers::order_details::get_prescription,
        crate::handlers::order_details::put_prescription,
        crate::handlers::order_details::delete_prescription,
        crate::handlers::order_details::list_prescriptions,

        // Products
        crate::handlers::products::create_product,
        crate::handlers::products::list_order_products,
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,

        // Catalog
        crate::handlers::catalog::list_frames,
        crate::handlers::catalog::create_frame,
        crate::handlers::catalog::get_frame,
        crate::handlers::catalog::update_frame,
        crate::handlers::catalog::delete_frame,
        crate::handlers::catalog::list_glass_types,
        crate::handlers::catalog::create_glass_type,
        crate::handlers::catalog::get_glass_type,
        crate::handlers::catalog::update_glass_type,
        crate::handlers::catalog::delete_glass_type,
        crate::handlers::catalog::list_lenses,
        crate::handlers::catalog::create_lens,
        crate::handlers::catalog::get_lens,
        crate::handlers::catalog::update_lens,
        crate::handlers::catalog::delete_lens,

        // Vouchers
        crate::handlers::vouchers::create_voucher,
        crate::handlers::vouchers::list_vouchers,
        crate::handlers::vouchers::get_voucher,
        crate::handlers::vouchers::update_voucher,
        crate::handlers::vouchers::delete_voucher,
        crate::handlers::vouchers::voucher_balance,
        crate::handlers::vouchers::link_order,
        crate::handlers::vouchers::unlink_order,
        crate::handlers::vouchers::add_line,
        crate::handlers::vouchers::remove_line,
    ),
    components(
        schemas(
            // Common types
            crate::errors::ErrorResponse,
            crate::handlers::public::Banner,

            // Users
            crate::services::users::CreateUserInput,
            crate::services::users::UserView,

            // Orders
            crate::services::orders::CreateOrderInput,
            crate::services::orders::ChangeOwnerInput,
            crate::services::orders::OrderView,
            crate::services::orders::OrderDetail,
            crate::services::orders::OrderSummary,
            crate::handlers::orders::OrderTotalPrice,

            // Order details
            crate::services::order_details::IdentityInput,
            crate::services::order_details::NewIdentityInput,
            crate::services::order_details::ContactInput,
            crate::services::order_details::InstitutionInput,
            crate::services::order_details::EyeMeasurements,
            crate::services::order_details::VisionMeasurements,
            crate::services::order_details::PrescriptionInput,
            crate::services::order_details::IdentityView,
            crate::services::order_details::ContactView,
            crate::services::order_details::InstitutionView,
            crate::services::order_details::PrescriptionView,

            // Products and catalog
            crate::services::products::ProductInput,
            crate::services::products::UpdateProductInput,
            crate::services::products::ProductView,
            crate::services::catalog::FrameInput,
            crate::services::catalog::GlassTypeInput,
            crate::services::catalog::LensInput,
            crate::services::catalog::FrameView,
            crate::services::catalog::GlassTypeView,
            crate::services::catalog::LensView,
            crate::entities::glass_type::Distance,
            crate::entities::glass_type::Treatment,

            // Vouchers
            crate::services::vouchers::CreateVoucherInput,
            crate::services::vouchers::UpdateVoucherInput,
            crate::services::vouchers::VoucherLineInput,
            crate::services::vouchers::VoucherLineView,
            crate::services::vouchers::VoucherOrderView,
            crate::services::vouchers::VoucherSummary,
            crate::services::vouchers::VoucherDetail,
            crate::services::pricing::VoucherBalance,
            crate::handlers::vouchers::LinkOrderInput,
            crate::entities::voucher::PaymentMethod,

            // Tunnel
            crate::services::tunnel::TunnelSubmission,
            crate::services::tunnel::TunnelProductInput,
            crate::services::tunnel::TunnelReceipt
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
