pub mod nowpayments_client;
