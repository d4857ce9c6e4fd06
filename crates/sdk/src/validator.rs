//! Deferred intent validation.
//!
//! With a deferred intent the merchant's server creates the real intent
//! after the customer confirms. Before completing the payment, the
//! server-returned intent is reconciled against the `IntentConfiguration`
//! the client declared, so that integration mistakes surface as a clear
//! error instead of an unexpected charge.
//!
//! Every check is a pure function of its inputs.

use tracing::debug;

use crate::{
    error::{DeferredIntentValidationError, Result},
    types::{
        ConfirmationMethod, Intent, IntentConfiguration, IntentKind, IntentMode, PaymentIntent,
        PaymentMethod, RetrievedIntent, SetupIntent,
    },
};

type ValidationResult = std::result::Result<(), DeferredIntentValidationError>;

/// Validate a server-returned payment intent against the client configuration
pub fn validate_payment_intent(
    payment_intent: &PaymentIntent,
    configuration: &IntentConfiguration,
    payment_method: &PaymentMethod,
    is_flow_controller: bool,
) -> ValidationResult {
    let IntentMode::Payment {
        currency,
        setup_future_usage,
        capture_method,
        ..
    } = &configuration.mode
    else {
        return Err(DeferredIntentValidationError::IntentModeMismatch {
            returned: IntentKind::Payment,
            mode: configuration.mode.intent_kind(),
        });
    };

    if !payment_intent.currency.eq_ignore_ascii_case(currency) {
        return Err(DeferredIntentValidationError::CurrencyMismatch {
            intent: payment_intent.currency.clone(),
            configured: currency.clone(),
        });
    }

    if payment_intent.setup_future_usage != *setup_future_usage {
        return Err(DeferredIntentValidationError::SetupFutureUsageMismatch {
            intent: payment_intent.setup_future_usage,
            configured: *setup_future_usage,
        });
    }

    if !payment_intent.capture_method.is_equivalent(capture_method) {
        return Err(DeferredIntentValidationError::CaptureMethodMismatch {
            intent: payment_intent.capture_method,
            configured: *capture_method,
        });
    }

    if payment_intent.confirmation_method == ConfirmationMethod::Manual && !is_flow_controller {
        return Err(DeferredIntentValidationError::ManualConfirmationRequiresFlowController);
    }

    check_payment_method(
        IntentKind::Payment,
        payment_intent.payment_method.as_deref(),
        payment_method,
    )
}

/// Validate a server-returned setup intent against the client configuration
pub fn validate_setup_intent(
    setup_intent: &SetupIntent,
    configuration: &IntentConfiguration,
    payment_method: &PaymentMethod,
) -> ValidationResult {
    let IntentMode::Setup {
        setup_future_usage, ..
    } = &configuration.mode
    else {
        return Err(DeferredIntentValidationError::IntentModeMismatch {
            returned: IntentKind::Setup,
            mode: configuration.mode.intent_kind(),
        });
    };

    if setup_intent.usage != *setup_future_usage {
        return Err(DeferredIntentValidationError::SetupIntentUsageMismatch {
            intent: setup_intent.usage,
            configured: *setup_future_usage,
        });
    }

    check_payment_method(
        IntentKind::Setup,
        setup_intent.payment_method.as_deref(),
        payment_method,
    )
}

/// Check the intent's attached payment method is the one being confirmed.
///
/// An intent with no payment method attached yet always passes.
pub fn validate_payment_method_id(
    intent: &RetrievedIntent,
    payment_method: &PaymentMethod,
) -> ValidationResult {
    check_payment_method(intent.kind(), intent.payment_method_id(), payment_method)
}

fn check_payment_method(
    kind: IntentKind,
    attached: Option<&str>,
    payment_method: &PaymentMethod,
) -> ValidationResult {
    match attached {
        Some(attached) if attached != payment_method.id => {
            Err(DeferredIntentValidationError::PaymentMethodMismatch {
                kind,
                intent_payment_method: attached.to_string(),
                confirm_payment_method: payment_method.id.clone(),
            })
        }
        _ => Ok(()),
    }
}

/// Validate a server-returned intent of either kind
pub fn validate_intent(
    intent: &RetrievedIntent,
    configuration: &IntentConfiguration,
    payment_method: &PaymentMethod,
    is_flow_controller: bool,
) -> ValidationResult {
    let result = match intent {
        RetrievedIntent::Payment(pi) => {
            validate_payment_intent(pi, configuration, payment_method, is_flow_controller)
        }
        RetrievedIntent::Setup(si) => validate_setup_intent(si, configuration, payment_method),
    };

    if let Err(ref e) = result {
        debug!(intent_id = %intent.id(), error = %e, "Deferred intent validation failed");
    }
    result
}

/// Reconcile the checkout's intent with the one the server returned.
///
/// Only deferred intents carry a client-declared configuration; realized
/// intents were created up front and pass through. A mismatch is returned as
/// [`PaymentSheetError::Validation`](crate::PaymentSheetError::Validation).
pub fn reconcile(
    intent: &Intent,
    returned: &RetrievedIntent,
    payment_method: &PaymentMethod,
    is_flow_controller: bool,
) -> Result<()> {
    if let Some(configuration) = intent.configuration() {
        validate_intent(returned, configuration, payment_method, is_flow_controller)?;
    }
    Ok(())
}
