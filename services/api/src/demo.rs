use admission_portal::error::AppError;
use admission_portal::workflows::admission::{
    AdmissionService, ApplicationStatusView, Email, Gender, InMemoryAdmissionRepository,
    InterviewRequest, Principal, Qualification, RegistrationForm, TimelineOrder,
    TransitionRequest,
};
use admission_portal::workflows::payments::{
    signature_header, CheckoutSettings, PaymentService, StripeCheckoutGateway, WebhookVerifier,
    CHECKOUT_COMPLETED,
};
use clap::Args;
use mockable::{Clock, DefaultClock};
use serde_json::json;
use std::sync::Arc;

const DEMO_WEBHOOK_SECRET: &str = "whsec_demo_only";
const DEMO_ADMIN: &str = "registrar@litschool.example";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Applicant email used for the walkthrough
    #[arg(long, default_value = "applicant@example.com")]
    pub(crate) email: String,
    /// Course the applicant registers for
    #[arg(long, default_value = "creator-marketer")]
    pub(crate) course: String,
    /// Stop after scheduling the interview instead of confirming payment
    #[arg(long)]
    pub(crate) skip_payment: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        email,
        course,
        skip_payment,
    } = args;

    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(DefaultClock);
    let repository = Arc::new(InMemoryAdmissionRepository::default());
    let admissions = AdmissionService::new(repository.clone(), clock.clone());

    println!("Admission portal demo");
    let view = match admissions.register(RegistrationForm {
        email: email.clone(),
        password: "demo-password".to_string(),
        name: "Demo Applicant".to_string(),
        age: Some(21),
        gender: Some(Gender::PreferNotToSay),
        qualification: Some(Qualification::College),
        course_choice: course,
    }) {
        Ok(view) => view,
        Err(err) => {
            println!("  Registration rejected: {}", err);
            return Ok(());
        }
    };
    print_view("Registered", &view);

    let (Ok(applicant_email), Ok(admin_email)) = (Email::parse(&email), Email::parse(DEMO_ADMIN))
    else {
        println!("  Demo identities are not valid email addresses");
        return Ok(());
    };
    let applicant = Principal::applicant(applicant_email);
    let admin = Principal::admin(admin_email);

    let view = match admissions.transition(&admin, admin_transition(&email, "interview")) {
        Ok(view) => view,
        Err(err) => {
            println!("  Interview invitation failed: {}", err);
            return Ok(());
        }
    };
    print_view("Invited to interview", &view);

    let booking = InterviewRequest {
        date: "2025-05-01".to_string(),
        time_slot: "10:00 AM".to_string(),
    };
    let view = match admissions.schedule_interview(&applicant, booking) {
        Ok(view) => view,
        Err(err) => {
            println!("  Interview booking failed: {}", err);
            return Ok(());
        }
    };
    print_view("Interview booked", &view);

    if skip_payment {
        return Ok(());
    }

    let view = match admissions.transition(&admin, admin_transition(&email, "payment")) {
        Ok(view) => view,
        Err(err) => {
            println!("  Payment request failed: {}", err);
            return Ok(());
        }
    };
    print_view("Awaiting payment", &view);

    let payments = PaymentService::new(
        repository,
        Arc::new(StripeCheckoutGateway::new("https://api.stripe.com", None)),
        WebhookVerifier::new(Some(DEMO_WEBHOOK_SECRET.to_string())),
        clock.clone(),
        CheckoutSettings {
            enrollment_fee_minor: 5_000_000,
            currency: "inr".to_string(),
            public_url: "http://localhost:3000".to_string(),
        },
    );
    let payload = json!({
        "id": "evt_demo",
        "type": CHECKOUT_COMPLETED,
        "data": { "object": {
            "id": "cs_demo",
            "payment_intent": "pi_demo",
            "amount_total": 5_000_000,
            "currency": "inr",
            "metadata": { "application_id": view.application_id.0, "user_email": email }
        }}
    })
    .to_string();
    let signature = signature_header(
        DEMO_WEBHOOK_SECRET,
        payload.as_bytes(),
        clock.utc().timestamp(),
    );

    println!("\nSimulated processor deliveries (the second is a redelivery)");
    for attempt in 1..=2 {
        match payments.confirm(payload.as_bytes(), Some(&signature)) {
            Ok(outcome) => match serde_json::to_string(&outcome) {
                Ok(json) => println!("  Delivery {}: {}", attempt, json),
                Err(err) => println!("  Delivery {}: unprintable outcome ({})", attempt, err),
            },
            Err(err) => println!("  Delivery {} rejected: {}", attempt, err),
        }
    }

    match admissions.status(&applicant, None, TimelineOrder::OldestFirst) {
        Ok(view) => print_view("Final status", &view),
        Err(err) => println!("  Final status unavailable: {}", err),
    }
    Ok(())
}

fn admin_transition(email: &str, status: &str) -> TransitionRequest {
    TransitionRequest {
        user_email: email.to_string(),
        status: Some(status.to_string()),
        note: None,
        expected_version: None,
    }
}

fn print_view(label: &str, view: &ApplicationStatusView) {
    println!(
        "\n{} -> {} (application {}, version {})",
        label, view.status, view.application_id, view.version
    );
    println!("  Next step: {}", view.next_step);
    for step in &view.timeline {
        println!(
            "  [{}] #{} {}",
            step.timestamp.format("%Y-%m-%d %H:%M:%S"),
            step.sequence,
            step.description
        );
    }
}
