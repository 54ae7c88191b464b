use chrono::NaiveDate;
use serde::Serialize;
use summit_core::{Gender, Member, MemberId};

use crate::{BlobStore, CollabContext, Database, HttpMethod, ServiceResult};

/// Read access to member profiles
pub struct Members<Db, Blob> {
    context: CollabContext<Db, Blob>,
}

/// Everything a member may see about themselves
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInformation {
    pub id: MemberId,
    pub identifier: String,
    pub nickname: String,
    pub gender: Gender,
    pub birthday: NaiveDate,
    pub phone_number: String,
    pub profile_image_url: String,
}

/// What other members see
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPublicInformation {
    pub id: MemberId,
    pub nickname: String,
    pub profile_image_url: String,
}

impl<Db, Blob> Members<Db, Blob>
where
    Db: Database,
    Blob: BlobStore,
{
    pub fn new(context: &CollabContext<Db, Blob>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    pub async fn information(&self, member_id: MemberId) -> ServiceResult<MemberInformation> {
        let member = self.context.database.member_by_id(member_id).await?;
        let profile_image_url = self.image_url(&member)?;

        Ok(MemberInformation {
            id: member.id,
            identifier: member.identifier.as_str().to_string(),
            nickname: member.nickname.as_str().to_string(),
            gender: member.profile.gender,
            birthday: member.profile.birthday,
            phone_number: member.profile.phone_number.as_str().to_string(),
            profile_image_url,
        })
    }

    pub async fn public_information(
        &self,
        member_id: MemberId,
    ) -> ServiceResult<MemberPublicInformation> {
        let member = self.context.database.member_by_id(member_id).await?;
        let profile_image_url = self.image_url(&member)?;

        Ok(MemberPublicInformation {
            id: member.id,
            nickname: member.nickname.as_str().to_string(),
            profile_image_url,
        })
    }

    fn image_url(&self, member: &Member) -> ServiceResult<String> {
        let url = self.context.storage.presigned_url(
            &member.image.server_file_path,
            HttpMethod::Get,
            self.context.config.url_expiration,
        )?;

        Ok(url.to_string())
    }
}
