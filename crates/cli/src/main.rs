use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use clinic_core::{AppointmentService, PatientDraft, PatientService};
use clinic_docstore::DocStore;
use clinic_uuid::RecordId;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic administration CLI")]
struct Cli {
    /// Document store root (defaults to $CLINIC_DATA_DIR, then /clinic_data)
    #[arg(long)]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patients
    ListPatients,
    /// Show one patient
    GetPatient {
        /// Patient record id
        id: String,
    },
    /// Create a patient
    CreatePatient {
        /// Full name
        name: String,
        /// Date of birth (YYYY-MM-DD)
        date_of_birth: String,
        /// Male, Female or Other
        gender: String,
        /// Contact details
        contact: String,
        /// Postal address (optional)
        #[arg(long)]
        address: Option<String>,
        /// Medical history notes (optional)
        #[arg(long)]
        medical_history: Option<String>,
    },
    /// List all appointments with patient summaries
    ListAppointments,
    /// Check a doctor's availability on a date
    Availability {
        /// Doctor identifier, e.g. "Dr. Smith"
        doctor: String,
        /// Date (YYYY-MM-DD)
        date: String,
    },
    /// Run the birthday age refresh once and print the report
    RefreshAges,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .or_else(|| std::env::var("CLINIC_DATA_DIR").ok())
        .unwrap_or_else(|| "/clinic_data".into());
    let store = DocStore::open(data_dir)?;

    match cli.command {
        Commands::ListPatients => {
            let service = PatientService::new(&store);
            let patients = service.list()?;
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                for patient in patients {
                    println!(
                        "ID: {}, Name: {}, Age: {}, Contact: {}",
                        patient.id, patient.data.name, patient.data.age, patient.data.contact
                    );
                }
            }
        }
        Commands::GetPatient { id } => {
            let service = PatientService::new(&store);
            let id = RecordId::parse(&id)?;
            let patient = service.get(&id)?;
            println!("ID: {}", patient.id);
            println!("Name: {}", patient.data.name);
            println!("Date of birth: {}", patient.data.date_of_birth);
            println!("Age: {}", patient.data.age);
            println!("Gender: {}", patient.data.gender);
            println!("Contact: {}", patient.data.contact);
            if let Some(address) = &patient.data.address {
                println!("Address: {address}");
            }
            if let Some(history) = &patient.data.medical_history {
                println!("Medical history: {history}");
            }
        }
        Commands::CreatePatient {
            name,
            date_of_birth,
            gender,
            contact,
            address,
            medical_history,
        } => {
            let service = PatientService::new(&store);
            let created = service.create(PatientDraft {
                name: Some(name),
                date_of_birth: Some(date_of_birth),
                gender: Some(gender),
                contact: Some(contact),
                address,
                medical_history,
            })?;
            println!(
                "Created patient {} ({}, age {})",
                created.id, created.data.name, created.data.age
            );
        }
        Commands::ListAppointments => {
            let service = AppointmentService::new(&store);
            let appointments = service.list()?;
            if appointments.is_empty() {
                println!("No appointments found.");
            } else {
                for joined in appointments {
                    let patient = joined
                        .patient
                        .map(|summary| summary.name)
                        .unwrap_or_else(|| "<deleted patient>".into());
                    println!(
                        "ID: {}, Patient: {}, Doctor: {}, Date: {}, Status: {}",
                        joined.appointment.id,
                        patient,
                        joined.appointment.data.doctor,
                        joined.appointment.data.date,
                        joined.appointment.data.status
                    );
                }
            }
        }
        Commands::Availability { doctor, date } => {
            let service = AppointmentService::new(&store);
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")?;
            let availability = service.check_availability(&doctor, date)?;
            println!("{}", availability.message);
            for conflict in availability.conflicts {
                println!(
                    "  {} at {}",
                    conflict.appointment.data.doctor, conflict.appointment.data.date
                );
            }
        }
        Commands::RefreshAges => {
            let service = PatientService::new(&store);
            let today = Local::now().date_naive();
            let report = service.refresh_birthday_ages(today)?;
            println!(
                "Age refresh for {today}: {} matched, {} updated, {} failed.",
                report.matched, report.updated, report.failed
            );
        }
    }

    Ok(())
}
