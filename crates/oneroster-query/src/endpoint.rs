//! Static per-resource metadata and the routable endpoint table.
//!
//! Every OneRoster resource has one [`EndpointConfig`]: its default sort
//! field, the fields a client may filter on and the ordered list of fields a
//! client may select. The table is compiled in and never mutated.
//!
//! Subset endpoints (`/schools`, `/students`, ...) reuse their parent
//! resource's configuration and add a [`FixedPredicate`].
//!
//! Filterable fields default to [`FieldType::Text`]; typed columns are listed
//! per resource in `field_types`.

use std::fmt;

use crate::field_type::FieldType;

/// One of the seven OneRoster rostering resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    AcademicSessions,
    Classes,
    Courses,
    Demographics,
    Enrollments,
    Orgs,
    Users,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        Self::AcademicSessions,
        Self::Classes,
        Self::Courses,
        Self::Demographics,
        Self::Enrollments,
        Self::Orgs,
        Self::Users,
    ];

    /// OneRoster resource name, also used as the collection wrapper key.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AcademicSessions => "academicSessions",
            Self::Classes => "classes",
            Self::Courses => "courses",
            Self::Demographics => "demographics",
            Self::Enrollments => "enrollments",
            Self::Orgs => "orgs",
            Self::Users => "users",
        }
    }

    /// Wrapper key for a single record.
    ///
    /// `demographics` keeps its plural form.
    #[must_use]
    pub const fn singular_key(self) -> &'static str {
        match self {
            Self::AcademicSessions => "academicSession",
            Self::Classes => "class",
            Self::Courses => "course",
            Self::Demographics => "demographics",
            Self::Enrollments => "enrollment",
            Self::Orgs => "org",
            Self::Users => "user",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable metadata for one resource.
#[derive(Debug, PartialEq, Eq)]
pub struct EndpointConfig {
    pub resource: ResourceKind,
    pub default_sort_field: &'static str,
    pub allowed_filter_fields: &'static [&'static str],
    pub selectable_fields: &'static [&'static str],
    pub field_types: &'static [(&'static str, FieldType)],
}

impl EndpointConfig {
    #[must_use]
    pub fn resource_name(&self) -> &'static str {
        self.resource.name()
    }

    /// Returns the allow-listed spelling of `field` if it may be filtered on.
    #[must_use]
    pub fn filterable(&self, field: &str) -> Option<&'static str> {
        self.allowed_filter_fields
            .iter()
            .copied()
            .find(|allowed| *allowed == field)
    }

    /// Returns the allow-listed spelling of `field` if it may be selected.
    #[must_use]
    pub fn selectable(&self, field: &str) -> Option<&'static str> {
        self.selectable_fields
            .iter()
            .copied()
            .find(|allowed| *allowed == field)
    }

    #[must_use]
    pub fn field_type(&self, field: &str) -> FieldType {
        self.field_types
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, ty)| *ty)
            .unwrap_or_default()
    }
}

/// A non user-controlled `field = value` restriction applied by a subset endpoint.
///
/// The field is a view column chosen at compile time and may be absent from
/// the filter allow-list (`role` on users is hidden from clients); it is
/// always compared as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPredicate {
    pub field: &'static str,
    pub value: &'static str,
}

impl FixedPredicate {
    #[must_use]
    pub const fn new(field: &'static str, value: &'static str) -> Self {
        Self { field, value }
    }
}

impl fmt::Display for FixedPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}='{}'", self.field, self.value)
    }
}

/// A routable collection under `/ims/oneroster/rostering/v1p2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    AcademicSessions,
    GradingPeriods,
    Terms,
    Classes,
    Courses,
    Demographics,
    Enrollments,
    Orgs,
    Schools,
    Users,
    Students,
    Teachers,
}

impl Endpoint {
    pub const ALL: [Endpoint; 12] = [
        Self::AcademicSessions,
        Self::GradingPeriods,
        Self::Terms,
        Self::Classes,
        Self::Courses,
        Self::Demographics,
        Self::Enrollments,
        Self::Orgs,
        Self::Schools,
        Self::Users,
        Self::Students,
        Self::Teachers,
    ];

    /// URL path segment.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::AcademicSessions => "academicSessions",
            Self::GradingPeriods => "gradingPeriods",
            Self::Terms => "terms",
            Self::Classes => "classes",
            Self::Courses => "courses",
            Self::Demographics => "demographics",
            Self::Enrollments => "enrollments",
            Self::Orgs => "orgs",
            Self::Schools => "schools",
            Self::Users => "users",
            Self::Students => "students",
            Self::Teachers => "teachers",
        }
    }

    /// The resource whose view backs this endpoint.
    #[must_use]
    pub const fn resource(self) -> ResourceKind {
        match self {
            Self::AcademicSessions | Self::GradingPeriods | Self::Terms => {
                ResourceKind::AcademicSessions
            }
            Self::Classes => ResourceKind::Classes,
            Self::Courses => ResourceKind::Courses,
            Self::Demographics => ResourceKind::Demographics,
            Self::Enrollments => ResourceKind::Enrollments,
            Self::Orgs | Self::Schools => ResourceKind::Orgs,
            Self::Users | Self::Students | Self::Teachers => ResourceKind::Users,
        }
    }

    #[must_use]
    pub const fn fixed_predicate(self) -> Option<FixedPredicate> {
        match self {
            Self::GradingPeriods => Some(FixedPredicate::new("type", "gradingPeriod")),
            Self::Terms => Some(FixedPredicate::new("type", "term")),
            Self::Schools => Some(FixedPredicate::new("type", "school")),
            Self::Students => Some(FixedPredicate::new("role", "student")),
            Self::Teachers => Some(FixedPredicate::new("role", "teacher")),
            _ => None,
        }
    }

    /// Subsets share their parent resource's collection key.
    #[must_use]
    pub const fn collection_key(self) -> &'static str {
        self.resource().name()
    }

    #[must_use]
    pub const fn singular_key(self) -> &'static str {
        self.resource().singular_key()
    }

    #[must_use]
    pub fn config(self) -> &'static EndpointConfig {
        EndpointConfigRegistry::get(self.resource())
    }

    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|endpoint| endpoint.path() == path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Error raised when the compiled-in table breaks one of its invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{resource}: default sort field '{field}' is not selectable")]
    DefaultSortNotSelectable {
        resource: &'static str,
        field: &'static str,
    },
    #[error("{resource}: field '{field}' is listed twice")]
    DuplicateField {
        resource: &'static str,
        field: &'static str,
    },
    #[error("{resource}: typed field '{field}' is not filterable")]
    TypedFieldNotFilterable {
        resource: &'static str,
        field: &'static str,
    },
}

/// Lookup over the compiled-in [`EndpointConfig`] table.
pub struct EndpointConfigRegistry;

impl EndpointConfigRegistry {
    #[must_use]
    pub fn get(resource: ResourceKind) -> &'static EndpointConfig {
        match resource {
            ResourceKind::AcademicSessions => &ACADEMIC_SESSIONS,
            ResourceKind::Classes => &CLASSES,
            ResourceKind::Courses => &COURSES,
            ResourceKind::Demographics => &DEMOGRAPHICS,
            ResourceKind::Enrollments => &ENROLLMENTS,
            ResourceKind::Orgs => &ORGS,
            ResourceKind::Users => &USERS,
        }
    }

    pub fn iter() -> impl Iterator<Item = &'static EndpointConfig> {
        ResourceKind::ALL.into_iter().map(Self::get)
    }

    /// Checks the table invariants. Called once at startup.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate() -> Result<(), RegistryError> {
        for config in Self::iter() {
            let resource = config.resource_name();
            if config.selectable(config.default_sort_field).is_none() {
                return Err(RegistryError::DefaultSortNotSelectable {
                    resource,
                    field: config.default_sort_field,
                });
            }
            for list in [config.allowed_filter_fields, config.selectable_fields] {
                for (i, field) in list.iter().enumerate() {
                    if list[..i].contains(field) {
                        return Err(RegistryError::DuplicateField { resource, field });
                    }
                }
            }
            if let Some((field, _)) = config
                .field_types
                .iter()
                .find(|(field, _)| config.filterable(field).is_none())
            {
                return Err(RegistryError::TypedFieldNotFilterable { resource, field });
            }
        }
        Ok(())
    }
}

static ACADEMIC_SESSIONS: EndpointConfig = EndpointConfig {
    resource: ResourceKind::AcademicSessions,
    default_sort_field: "sourcedId",
    allowed_filter_fields: &[
        "sourcedId",
        "status",
        "dateLastModified",
        "title",
        "type",
        "startDate",
        "endDate",
        "schoolYear",
    ],
    selectable_fields: &[
        "sourcedId",
        "status",
        "dateLastModified",
        "title",
        "type",
        "startDate",
        "endDate",
        "parent",
        "schoolYear",
        "metadata",
    ],
    field_types: &[
        ("dateLastModified", FieldType::Timestamp),
        ("startDate", FieldType::Date),
        ("endDate", FieldType::Date),
        ("schoolYear", FieldType::Integer),
    ],
};

static CLASSES: EndpointConfig = EndpointConfig {
    resource: ResourceKind::Classes,
    default_sort_field: "sourcedId",
    allowed_filter_fields: &[
        "sourcedId",
        "status",
        "dateLastModified",
        "title",
        "classCode",
        "classType",
        "location",
        "periods",
    ],
    selectable_fields: &[
        "sourcedId",
        "status",
        "dateLastModified",
        "title",
        "classCode",
        "classType",
        "location",
        "grades",
        "subjects",
        "course",
        "school",
        "terms",
        "subjectCodes",
        "periods",
        "resources",
        "metadata",
    ],
    field_types: &[("dateLastModified", FieldType::Timestamp)],
};

static COURSES: EndpointConfig = EndpointConfig {
    resource: ResourceKind::Courses,
    default_sort_field: "sourcedId",
    allowed_filter_fields: &["sourcedId", "status", "dateLastModified", "title", "courseCode"],
    selectable_fields: &[
        "sourcedId",
        "status",
        "dateLastModified",
        "title",
        "schoolYear",
        "courseCode",
        "grades",
        "subjects",
        "org",
        "subjectCodes",
        "resources",
        "metadata",
    ],
    field_types: &[("dateLastModified", FieldType::Timestamp)],
};

static DEMOGRAPHICS: EndpointConfig = EndpointConfig {
    resource: ResourceKind::Demographics,
    default_sort_field: "sourcedId",
    allowed_filter_fields: &[
        "sourcedId",
        "status",
        "dateLastModified",
        "birthDate",
        "sex",
        "americanIndianOrAlaskaNative",
        "asian",
        "blackOrAfricanAmerican",
        "nativeHawaiianOrOtherPacificIslander",
        "white",
        "demographicRaceTwoOrMoreRaces",
        "hispanicOrLatinoEthnicity",
        "countryOfBirthCode",
        "stateOfBirthAbbreviation",
        "cityOfBirth",
    ],
    selectable_fields: &[
        "sourcedId",
        "status",
        "dateLastModified",
        "birthDate",
        "sex",
        "americanIndianOrAlaskaNative",
        "asian",
        "blackOrAfricanAmerican",
        "nativeHawaiianOrOtherPacificIslander",
        "white",
        "demographicRaceTwoOrMoreRaces",
        "hispanicOrLatinoEthnicity",
        "countryOfBirthCode",
        "stateOfBirthAbbreviation",
        "cityOfBirth",
        "publicSchoolResidenceStatus",
        "metadata",
    ],
    field_types: &[
        ("dateLastModified", FieldType::Timestamp),
        ("birthDate", FieldType::Date),
        ("americanIndianOrAlaskaNative", FieldType::Boolean),
        ("asian", FieldType::Boolean),
        ("blackOrAfricanAmerican", FieldType::Boolean),
        ("nativeHawaiianOrOtherPacificIslander", FieldType::Boolean),
        ("white", FieldType::Boolean),
        ("demographicRaceTwoOrMoreRaces", FieldType::Boolean),
        ("hispanicOrLatinoEthnicity", FieldType::Boolean),
    ],
};

static ENROLLMENTS: EndpointConfig = EndpointConfig {
    resource: ResourceKind::Enrollments,
    default_sort_field: "sourcedId",
    allowed_filter_fields: &[
        "sourcedId",
        "status",
        "dateLastModified",
        "role",
        "primary",
        "beginDate",
        "endDate",
    ],
    selectable_fields: &[
        "sourcedId",
        "status",
        "dateLastModified",
        "class",
        "user",
        "school",
        "role",
        "primary",
        "beginDate",
        "endDate",
        "metadata",
    ],
    field_types: &[
        ("dateLastModified", FieldType::Timestamp),
        ("primary", FieldType::Boolean),
        ("beginDate", FieldType::Date),
        ("endDate", FieldType::Date),
    ],
};

static ORGS: EndpointConfig = EndpointConfig {
    resource: ResourceKind::Orgs,
    default_sort_field: "sourcedId",
    allowed_filter_fields: &[
        "sourcedId",
        "status",
        "dateLastModified",
        "name",
        "type",
        "identifier",
    ],
    selectable_fields: &[
        "sourcedId",
        "status",
        "dateLastModified",
        "name",
        "type",
        "identifier",
        "parent",
        "children",
        "metadata",
    ],
    field_types: &[("dateLastModified", FieldType::Timestamp)],
};

static USERS: EndpointConfig = EndpointConfig {
    resource: ResourceKind::Users,
    default_sort_field: "sourcedId",
    allowed_filter_fields: &[
        "sourcedId",
        "status",
        "dateLastModified",
        "username",
        "enabledUser",
        "givenName",
        "familyName",
        "middleName",
        "preferredFirstName",
        "preferredMiddleName",
        "preferredLastName",
        "roles",
        "identifier",
        "email",
    ],
    selectable_fields: &[
        "sourcedId",
        "status",
        "dateLastModified",
        "userMasterIdentifier",
        "username",
        "userIds",
        "enabledUser",
        "givenName",
        "familyName",
        "middleName",
        "preferredFirstName",
        "preferredMiddleName",
        "preferredLastName",
        "pronouns",
        "roles",
        "userProfiles",
        "identifier",
        "email",
        "sms",
        "phone",
        "agentSourceIds",
        "grades",
        "password",
        "metadata",
    ],
    field_types: &[
        ("dateLastModified", FieldType::Timestamp),
        ("enabledUser", FieldType::Boolean),
    ],
};
